use crate::config::CaptureConfig;
use pcap::{Active, Capture, Device, Offline, Packet, Savefile};
use std::fmt;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum CaptureError {
    /// No usable capture device, or the named one does not exist.
    NoDevice(String),
    Pcap(pcap::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoDevice(name) => write!(f, "no capture device: {}", name),
            CaptureError::Pcap(err) => write!(f, "pcap error: {}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Pcap(err) => Some(err),
            CaptureError::NoDevice(_) => None,
        }
    }
}

impl From<pcap::Error> for CaptureError {
    fn from(err: pcap::Error) -> Self {
        CaptureError::Pcap(err)
    }
}

/// Enumerate capture-capable interfaces for `--list-interfaces`.
pub fn list_interfaces() -> Result<Vec<(String, Option<String>)>, CaptureError> {
    let devices = Device::list()?;
    Ok(devices
        .into_iter()
        .map(|dev| (dev.name, dev.desc))
        .collect())
}

fn resolve_device(name: Option<&str>) -> Result<Device, CaptureError> {
    match name {
        Some(wanted) => Device::list()?
            .into_iter()
            .find(|dev| dev.name == wanted)
            .ok_or_else(|| CaptureError::NoDevice(wanted.to_string())),
        None => Device::lookup()?
            .ok_or_else(|| CaptureError::NoDevice("no default device".to_string())),
    }
}

/// Open a live capture on the configured interface with the netwayste
/// filter applied. Immediate mode keeps per-packet latency low enough
/// to watch a game session in real time.
pub fn open_capture(config: &CaptureConfig) -> Result<Capture<Active>, CaptureError> {
    let device = resolve_device(config.interface.as_deref())?;
    let device_name = device.name.clone();

    let mut capture = Capture::from_device(device)?
        .promisc(config.promiscuous)
        .snaplen(config.snaplen)
        .timeout(config.timeout_ms)
        .immediate_mode(true)
        .open()?;

    let filter = config
        .filter
        .clone()
        .unwrap_or_else(|| format!("udp port {}", config.port));
    capture.filter(&filter, true)?;

    info!(
        device = %device_name,
        filter = %filter,
        promiscuous = config.promiscuous,
        snaplen = config.snaplen,
        "capture started"
    );

    Ok(capture)
}

/// Open a pcap savefile for offline replay. The port filter still
/// applies so a mixed trace behaves the same as a live capture.
pub fn open_savefile(path: &Path, config: &CaptureConfig) -> Result<Capture<Offline>, CaptureError> {
    let mut capture = Capture::from_file(path)?;
    let filter = config
        .filter
        .clone()
        .unwrap_or_else(|| format!("udp port {}", config.port));
    capture.filter(&filter, true)?;

    info!(file = %path.display(), filter = %filter, "replaying savefile");
    Ok(capture)
}

/// A live interface and an offline savefile yield packets through the
/// same interface so the dissection loop does not care which it has.
pub enum PacketSource {
    Live(Capture<Active>),
    File(Capture<Offline>),
}

impl PacketSource {
    pub fn next_packet(&mut self) -> Result<Packet<'_>, pcap::Error> {
        match self {
            PacketSource::Live(capture) => capture.next_packet(),
            PacketSource::File(capture) => capture.next_packet(),
        }
    }

    pub fn savefile(&self, path: &Path) -> Result<Savefile, pcap::Error> {
        match self {
            PacketSource::Live(capture) => capture.savefile(path),
            PacketSource::File(capture) => capture.savefile(path),
        }
    }
}
