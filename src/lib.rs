//! Passive dissector for netwayste game-server UDP traffic.
//!
//! Captures datagrams from a live interface or a pcap savefile,
//! parses the ethernet/IP/UDP framing with zero-copy header views,
//! decodes the bincode-encoded netwayste packets, and tracks
//! per-session statistics and protocol health.

pub mod analysis;
pub mod capture;
pub mod cli;
pub mod config;
pub mod display;
pub mod frame;
pub mod session;
pub mod wire;
