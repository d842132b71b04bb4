use crate::wire;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

fn empty_path_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(opt.and_then(|path| {
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }))
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config io error: {}", err),
            ConfigError::Parse(err) => write!(f, "config parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
    pub session: SessionConfig,
    pub stats: StatsConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&raw).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub interface: Option<String>,
    /// Server UDP port; drives the default BPF filter and session keying.
    pub port: u16,
    pub promiscuous: bool,
    pub snaplen: i32,
    pub timeout_ms: i32,
    /// Override for the default `udp port <port>` filter.
    pub filter: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            interface: None,
            port: wire::DEFAULT_PORT,
            promiscuous: true,
            snaplen: 65535,
            timeout_ms: 100,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after this many packets; 0 = unlimited.
    pub count: u64,
    /// Replay a pcap savefile instead of capturing live.
    #[serde(deserialize_with = "empty_path_none")]
    pub read_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            count: 0,
            read_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(deserialize_with = "empty_path_none")]
    pub write_pcap: Option<PathBuf>,
    #[serde(deserialize_with = "empty_path_none")]
    pub export_json: Option<PathBuf>,
    #[serde(deserialize_with = "empty_path_none")]
    pub export_csv: Option<PathBuf>,
    pub hex_dump: bool,
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            write_pcap: None,
            export_json: None,
            export_csv: None,
            hex_dump: false,
            quiet: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeout_secs: f64,
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            timeout_secs: 120.0,
            max_sessions: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub top_sessions: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            enabled: false,
            interval_ms: 1000,
            top_sessions: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub health: HealthConfig,
    #[serde(deserialize_with = "empty_path_none")]
    pub alerts_jsonl: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            health: HealthConfig::default(),
            alerts_jsonl: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub retransmit_storm: RetransmitStormConfig,
    pub connect_flood: ConnectFloodConfig,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            enabled: false,
            retransmit_storm: RetransmitStormConfig::default(),
            connect_flood: ConnectFloodConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetransmitStormConfig {
    pub enabled: bool,
    pub window_secs: f64,
    pub duplicate_threshold: u32,
    pub cooldown_secs: f64,
}

impl Default for RetransmitStormConfig {
    fn default() -> Self {
        RetransmitStormConfig {
            enabled: true,
            window_secs: 5.0,
            duplicate_threshold: 20,
            cooldown_secs: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectFloodConfig {
    pub enabled: bool,
    pub window_secs: f64,
    pub unique_client_threshold: u32,
    pub cooldown_secs: f64,
}

impl Default for ConnectFloodConfig {
    fn default() -> Self {
        ConnectFloodConfig {
            enabled: true,
            window_secs: 10.0,
            unique_client_threshold: 30,
            cooldown_secs: 30.0,
        }
    }
}
