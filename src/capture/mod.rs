mod engine;

pub use engine::{
    list_interfaces, open_capture, open_savefile, CaptureError, PacketSource,
};
