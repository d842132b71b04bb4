use crate::config::HealthConfig;
use crate::session::{Endpoint, Observed, SessionKey};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

const CLEANUP_INTERVAL_SECS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A session is resending the same sequence numbers at a rate
    /// that suggests the other side stopped acknowledging.
    RetransmitStorm,
    /// Many distinct clients sent connect requests to one server in a
    /// short window.
    ConnectFlood,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RetransmitStorm => "retransmit_storm",
            AlertKind::ConnectFlood => "connect_flood",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub ts: f64,
    pub kind: AlertKind,
    pub description: String,
}

struct StormState {
    duplicates: VecDeque<f64>,
    last_alert: Option<f64>,
}

struct FloodState {
    attempts: VecDeque<(f64, Endpoint)>,
    last_alert: Option<f64>,
}

/// Watches the stream of observed packets for protocol-level trouble.
/// Windows are pruned lazily on each observation and swept wholesale
/// every `CLEANUP_INTERVAL_SECS` so idle keys do not accumulate.
pub struct HealthMonitor {
    config: HealthConfig,
    storms: AHashMap<SessionKey, StormState>,
    floods: AHashMap<Endpoint, FloodState>,
    last_cleanup: f64,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        HealthMonitor {
            config,
            storms: AHashMap::new(),
            floods: AHashMap::new(),
            last_cleanup: 0.0,
        }
    }

    pub fn observe(&mut self, ts: f64, observed: &Observed) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if !self.config.enabled {
            return alerts;
        }

        if self.config.retransmit_storm.enabled && observed.duplicate_request {
            if let Some(alert) = self.observe_duplicate(ts, &observed.key) {
                alerts.push(alert);
            }
        }
        if self.config.connect_flood.enabled && observed.connect_attempt {
            if let Some(alert) = self.observe_connect(ts, &observed.key) {
                alerts.push(alert);
            }
        }

        if ts - self.last_cleanup >= CLEANUP_INTERVAL_SECS {
            self.cleanup(ts);
            self.last_cleanup = ts;
        }

        alerts
    }

    fn observe_duplicate(&mut self, ts: f64, key: &SessionKey) -> Option<Alert> {
        let cfg = &self.config.retransmit_storm;
        let state = self.storms.entry(*key).or_insert_with(|| StormState {
            duplicates: VecDeque::new(),
            last_alert: None,
        });

        state.duplicates.push_back(ts);
        let cutoff = ts - cfg.window_secs;
        while state.duplicates.front().is_some_and(|&t| t < cutoff) {
            state.duplicates.pop_front();
        }

        if state.duplicates.len() < cfg.duplicate_threshold as usize {
            return None;
        }
        if state
            .last_alert
            .is_some_and(|last| ts - last < cfg.cooldown_secs)
        {
            return None;
        }
        state.last_alert = Some(ts);

        Some(Alert {
            ts,
            kind: AlertKind::RetransmitStorm,
            description: format!(
                "{} duplicate requests from {} to {} in {:.0}s",
                state.duplicates.len(),
                key.client,
                key.server,
                cfg.window_secs
            ),
        })
    }

    fn observe_connect(&mut self, ts: f64, key: &SessionKey) -> Option<Alert> {
        let cfg = &self.config.connect_flood;
        let state = self
            .floods
            .entry(key.server)
            .or_insert_with(|| FloodState {
                attempts: VecDeque::new(),
                last_alert: None,
            });

        state.attempts.push_back((ts, key.client));
        let cutoff = ts - cfg.window_secs;
        while state.attempts.front().is_some_and(|&(t, _)| t < cutoff) {
            state.attempts.pop_front();
        }

        let unique: AHashSet<&Endpoint> =
            state.attempts.iter().map(|(_, client)| client).collect();
        if unique.len() < cfg.unique_client_threshold as usize {
            return None;
        }
        if state
            .last_alert
            .is_some_and(|last| ts - last < cfg.cooldown_secs)
        {
            return None;
        }
        state.last_alert = Some(ts);

        Some(Alert {
            ts,
            kind: AlertKind::ConnectFlood,
            description: format!(
                "{} distinct clients connecting to {} in {:.0}s",
                unique.len(),
                key.server,
                cfg.window_secs
            ),
        })
    }

    fn cleanup(&mut self, ts: f64) {
        let storm_cutoff = ts - self.config.retransmit_storm.window_secs;
        self.storms.retain(|_, state| {
            state.duplicates.back().is_some_and(|&t| t >= storm_cutoff)
        });
        let flood_cutoff = ts - self.config.connect_flood.window_secs;
        self.floods.retain(|_, state| {
            state.attempts.back().is_some_and(|&(t, _)| t >= flood_cutoff)
        });
    }
}

/// Append-only JSONL alert log. Write errors are reported once per
/// failure but never abort the capture.
pub struct AlertSink {
    file: File,
}

impl AlertSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(AlertSink { file })
    }

    pub fn write(&mut self, alert: &Alert) {
        match serde_json::to_string(alert) {
            Ok(line) => {
                if let Err(err) = writeln!(self.file, "{}", line) {
                    warn!(error = %err, "failed to append alert");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize alert"),
        }
    }
}
