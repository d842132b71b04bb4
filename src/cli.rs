use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command line flags. Anything set here overrides the config file.
#[derive(Debug, Parser)]
#[command(
    name = "nwscope",
    version,
    about = "Capture and dissect netwayste game-server UDP traffic"
)]
pub struct Cli {
    /// Network interface to capture on (defaults to the first usable device)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Server UDP port (drives the capture filter and session direction)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// BPF filter expression overriding the default "udp port <port>"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Read packets from a pcap savefile instead of capturing live
    #[arg(short, long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Stop after this many packets (0 = unlimited)
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Capture snapshot length in bytes
    #[arg(short, long)]
    pub snaplen: Option<i32>,

    /// Capture read timeout in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<i32>,

    /// Enable promiscuous mode
    #[arg(long, overrides_with = "no_promiscuous")]
    pub promiscuous: bool,

    /// Disable promiscuous mode
    #[arg(long)]
    pub no_promiscuous: bool,

    /// Increase verbosity (-v packet info + decode failures, -vv full dissection)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Show hex dumps of packet payloads
    #[arg(long)]
    pub hex_dump: bool,

    /// Suppress per-packet output
    #[arg(long)]
    pub quiet: bool,

    /// Print periodic throughput statistics
    #[arg(long, overrides_with = "no_stats")]
    pub stats: bool,

    /// Disable periodic statistics
    #[arg(long)]
    pub no_stats: bool,

    /// Statistics interval in milliseconds
    #[arg(long)]
    pub stats_interval_ms: Option<u64>,

    /// Show the N busiest sessions with each statistics line
    #[arg(long, value_name = "N")]
    pub top_sessions: Option<u32>,

    /// Expire idle sessions after this many seconds
    #[arg(long)]
    pub session_timeout_s: Option<f64>,

    /// Maximum number of tracked sessions
    #[arg(long)]
    pub max_sessions: Option<usize>,

    /// Write captured packets to a pcap savefile
    #[arg(long, value_name = "FILE")]
    pub write_pcap: Option<PathBuf>,

    /// Export session summaries as JSON on exit
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export session summaries as CSV on exit
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Append health alerts to a JSONL file
    #[arg(long, value_name = "FILE")]
    pub alerts_jsonl: Option<PathBuf>,

    /// Enable protocol health monitoring
    #[arg(long, overrides_with = "no_health")]
    pub health: bool,

    /// Disable protocol health monitoring
    #[arg(long)]
    pub no_health: bool,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List available capture interfaces and exit
    #[arg(short, long)]
    pub list_interfaces: bool,
}
