//! Per-session state across the captured stream.
//!
//! A session is one client endpoint talking to one netwayste server
//! endpoint. Both directions of the exchange land in the same entry: the
//! server side is whichever endpoint carries the configured server port.
//! Tracks byte/packet counts per direction, per-kind packet counts,
//! sequence continuity of client Requests and server Responses, and ping
//! round-trip time from the nonce echo in GetStatus/Status and
//! Update/UpdateReply pairs.

use crate::wire::{Packet, RequestAction, ResponseCode};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::IpAddr;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Which way a datagram travelled, relative to the session's server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToServer,
    ToClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey {
    pub client: Endpoint,
    pub server: Endpoint,
}

impl SessionKey {
    /// Orient a (src, dst) pair into (session key, direction). The caller
    /// guarantees one side uses `server_port`; when both do (server talking
    /// to another server), the destination is treated as the server.
    pub fn classify(src: Endpoint, dst: Endpoint, server_port: u16) -> (Self, Direction) {
        if dst.port == server_port {
            (
                SessionKey {
                    client: src,
                    server: dst,
                },
                Direction::ToServer,
            )
        } else {
            (
                SessionKey {
                    client: dst,
                    server: src,
                },
                Direction::ToClient,
            )
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.client, self.server)
    }
}

/// Verdict on a sequence number within one direction's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeqStatus {
    /// Higher than anything seen; `gap` numbers were skipped to get here.
    Advanced { gap: u64 },
    /// Seen before — the sender retransmitted.
    Duplicate,
    /// Below the high-water mark but not seen before: a late arrival.
    Late,
}

/// Recent-window sequence tracker. netwayste sequences are u64 counters
/// starting near zero, so no wraparound handling is needed.
#[derive(Debug, Clone, Default)]
struct SeqWindow {
    max_seq: Option<u64>,
    recent: VecDeque<u64>,
}

/// How many sequence numbers to remember for duplicate detection.
const SEQ_WINDOW: usize = 64;

impl SeqWindow {
    fn observe(&mut self, seq: u64) -> SeqStatus {
        let status = match self.max_seq {
            None => {
                self.max_seq = Some(seq);
                SeqStatus::Advanced { gap: 0 }
            }
            Some(max) if seq > max => {
                self.max_seq = Some(seq);
                SeqStatus::Advanced { gap: seq - max - 1 }
            }
            Some(max) if seq == max || self.recent.contains(&seq) => SeqStatus::Duplicate,
            Some(_) => SeqStatus::Late,
        };

        if !matches!(status, SeqStatus::Duplicate) {
            if self.recent.len() >= SEQ_WINDOW {
                self.recent.pop_front();
            }
            self.recent.push_back(seq);
        }

        status
    }
}

/// Outstanding ping nonces awaiting their echo.
#[derive(Debug, Clone, Default)]
struct PingLedger {
    in_flight: VecDeque<(u64, f64)>,
}

/// Cap on outstanding nonces per direction per session.
const PING_LEDGER_CAP: usize = 128;

impl PingLedger {
    fn record(&mut self, nonce: u64, ts: f64) {
        if self.in_flight.len() >= PING_LEDGER_CAP {
            self.in_flight.pop_front();
        }
        self.in_flight.push_back((nonce, ts));
    }

    /// Match an echoed nonce; returns the round-trip time in milliseconds.
    fn settle(&mut self, nonce: u64, ts: f64) -> Option<f64> {
        let idx = self.in_flight.iter().position(|(n, _)| *n == nonce)?;
        let (_, sent_ts) = self.in_flight.remove(idx)?;
        Some((ts - sent_ts).max(0.0) * 1000.0)
    }
}

/// What the tracker learned from one datagram, for the health monitors.
#[derive(Debug, Clone, Copy)]
pub struct Observed {
    pub key: SessionKey,
    pub duplicate_request: bool,
    pub connect_attempt: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub first_seen: f64,
    pub last_seen: f64,
    pub packets_to_server: u64,
    pub packets_to_client: u64,
    pub bytes_to_server: u64,
    pub bytes_to_client: u64,
    pub requests: u64,
    pub responses: u64,
    pub updates: u64,
    pub update_replies: u64,
    pub status_queries: u64,
    pub status_reports: u64,
    pub chat_messages: u64,
    pub response_errors: u64,
    pub request_duplicates: u64,
    pub request_late: u64,
    pub request_gaps: u64,
    pub response_duplicates: u64,
    pub response_late: u64,
    pub response_gaps: u64,
    pub cookie: Option<String>,
    pub player_name: Option<String>,
    pub rtt_last_ms: Option<f64>,
    pub rtt_min_ms: Option<f64>,
    pub rtt_ewma_ms: Option<f64>,
    pub rtt_samples: u64,
    #[serde(skip)]
    last_report_bytes: u64,
    #[serde(skip)]
    request_seq: SeqWindow,
    #[serde(skip)]
    response_seq: SeqWindow,
    #[serde(skip)]
    client_pings: PingLedger,
    #[serde(skip)]
    server_pings: PingLedger,
}

impl SessionEntry {
    fn new(ts: f64) -> Self {
        SessionEntry {
            first_seen: ts,
            last_seen: ts,
            packets_to_server: 0,
            packets_to_client: 0,
            bytes_to_server: 0,
            bytes_to_client: 0,
            requests: 0,
            responses: 0,
            updates: 0,
            update_replies: 0,
            status_queries: 0,
            status_reports: 0,
            chat_messages: 0,
            response_errors: 0,
            request_duplicates: 0,
            request_late: 0,
            request_gaps: 0,
            response_duplicates: 0,
            response_late: 0,
            response_gaps: 0,
            cookie: None,
            player_name: None,
            rtt_last_ms: None,
            rtt_min_ms: None,
            rtt_ewma_ms: None,
            rtt_samples: 0,
            last_report_bytes: 0,
            request_seq: SeqWindow::default(),
            response_seq: SeqWindow::default(),
            client_pings: PingLedger::default(),
            server_pings: PingLedger::default(),
        }
    }

    /// Apply one decoded datagram. Returns true when the packet was a
    /// duplicate client Request (retransmission signal for health checks).
    fn observe(&mut self, ts: f64, direction: Direction, wire_len: u64, packet: &Packet) -> bool {
        self.last_seen = ts;
        match direction {
            Direction::ToServer => {
                self.packets_to_server += 1;
                self.bytes_to_server += wire_len;
            }
            Direction::ToClient => {
                self.packets_to_client += 1;
                self.bytes_to_client += wire_len;
            }
        }

        let mut duplicate_request = false;

        match packet {
            Packet::Request {
                sequence,
                cookie,
                action,
                ..
            } => {
                self.requests += 1;
                match self.request_seq.observe(*sequence) {
                    SeqStatus::Advanced { gap } => self.request_gaps += gap,
                    SeqStatus::Duplicate => {
                        self.request_duplicates += 1;
                        duplicate_request = true;
                    }
                    SeqStatus::Late => self.request_late += 1,
                }
                if self.cookie.is_none() {
                    self.cookie = cookie.clone();
                }
                match action {
                    RequestAction::Connect { name, .. } => {
                        self.player_name = Some(name.clone());
                    }
                    RequestAction::ChatMessage { .. } => {
                        self.chat_messages += 1;
                    }
                    _ => {}
                }
            }
            Packet::Response { sequence, code, .. } => {
                self.responses += 1;
                match self.response_seq.observe(*sequence) {
                    SeqStatus::Advanced { gap } => self.response_gaps += gap,
                    SeqStatus::Duplicate => self.response_duplicates += 1,
                    SeqStatus::Late => self.response_late += 1,
                }
                if code.is_error() {
                    self.response_errors += 1;
                }
                if let ResponseCode::LoggedIn { cookie, .. } = code {
                    self.cookie = Some(cookie.clone());
                }
            }
            Packet::Update { chats, ping, .. } => {
                self.updates += 1;
                self.chat_messages += chats.len() as u64;
                self.server_pings.record(ping.nonce, ts);
            }
            Packet::UpdateReply { cookie, pong, .. } => {
                self.update_replies += 1;
                if self.cookie.is_none() {
                    self.cookie = Some(cookie.clone());
                }
                if let Some(rtt_ms) = self.server_pings.settle(pong.nonce, ts) {
                    self.record_rtt(rtt_ms);
                }
            }
            Packet::GetStatus { ping } => {
                self.status_queries += 1;
                self.client_pings.record(ping.nonce, ts);
            }
            Packet::Status { pong, .. } => {
                self.status_reports += 1;
                if let Some(rtt_ms) = self.client_pings.settle(pong.nonce, ts) {
                    self.record_rtt(rtt_ms);
                }
            }
        }

        duplicate_request
    }

    fn record_rtt(&mut self, rtt_ms: f64) {
        self.rtt_last_ms = Some(rtt_ms);
        self.rtt_min_ms = Some(self.rtt_min_ms.map_or(rtt_ms, |min| min.min(rtt_ms)));
        let ewma = match self.rtt_ewma_ms {
            Some(prev) => 0.875 * prev + 0.125 * rtt_ms,
            None => rtt_ms,
        };
        self.rtt_ewma_ms = Some(ewma);
        self.rtt_samples += 1;
    }

    fn total_bytes(&self) -> u64 {
        self.bytes_to_server + self.bytes_to_client
    }

    fn total_packets(&self) -> u64 {
        self.packets_to_server + self.packets_to_client
    }
}

/// Point-in-time, serializable copy of a session for exports and stats.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub client: Endpoint,
    pub server: Endpoint,
    pub first_seen: f64,
    pub last_seen: f64,
    pub duration_secs: f64,
    pub packets_to_server: u64,
    pub packets_to_client: u64,
    pub bytes_to_server: u64,
    pub bytes_to_client: u64,
    pub packets_total: u64,
    pub bytes_total: u64,
    pub requests: u64,
    pub responses: u64,
    pub updates: u64,
    pub update_replies: u64,
    pub status_queries: u64,
    pub status_reports: u64,
    pub chat_messages: u64,
    pub response_errors: u64,
    pub request_duplicates: u64,
    pub request_late: u64,
    pub request_gaps: u64,
    pub response_duplicates: u64,
    pub response_late: u64,
    pub response_gaps: u64,
    pub cookie: Option<String>,
    pub player_name: Option<String>,
    pub rtt_last_ms: Option<f64>,
    pub rtt_min_ms: Option<f64>,
    pub rtt_ewma_ms: Option<f64>,
    pub rtt_samples: u64,
}

impl SessionSnapshot {
    fn from_entry(key: &SessionKey, entry: &SessionEntry) -> Self {
        SessionSnapshot {
            client: key.client,
            server: key.server,
            first_seen: entry.first_seen,
            last_seen: entry.last_seen,
            duration_secs: (entry.last_seen - entry.first_seen).max(0.0),
            packets_to_server: entry.packets_to_server,
            packets_to_client: entry.packets_to_client,
            bytes_to_server: entry.bytes_to_server,
            bytes_to_client: entry.bytes_to_client,
            packets_total: entry.total_packets(),
            bytes_total: entry.total_bytes(),
            requests: entry.requests,
            responses: entry.responses,
            updates: entry.updates,
            update_replies: entry.update_replies,
            status_queries: entry.status_queries,
            status_reports: entry.status_reports,
            chat_messages: entry.chat_messages,
            response_errors: entry.response_errors,
            request_duplicates: entry.request_duplicates,
            request_late: entry.request_late,
            request_gaps: entry.request_gaps,
            response_duplicates: entry.response_duplicates,
            response_late: entry.response_late,
            response_gaps: entry.response_gaps,
            cookie: entry.cookie.clone(),
            player_name: entry.player_name.clone(),
            rtt_last_ms: entry.rtt_last_ms,
            rtt_min_ms: entry.rtt_min_ms,
            rtt_ewma_ms: entry.rtt_ewma_ms,
            rtt_samples: entry.rtt_samples,
        }
    }
}

/// A session's byte delta since the last stats report.
#[derive(Debug, Clone)]
pub struct SessionDelta {
    pub key: SessionKey,
    pub delta_bytes: u64,
}

#[derive(Debug)]
pub struct SessionTracker {
    sessions: HashMap<SessionKey, SessionEntry>,
    server_port: u16,
    timeout_secs: f64,
    max_sessions: usize,
    last_prune: f64,
}

impl SessionTracker {
    pub fn new(server_port: u16, timeout_secs: f64, max_sessions: usize) -> Self {
        SessionTracker {
            sessions: HashMap::new(),
            server_port,
            timeout_secs,
            max_sessions,
            last_prune: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Feed one decoded datagram into the tracker.
    pub fn observe(
        &mut self,
        ts: f64,
        wire_len: u64,
        src: Endpoint,
        dst: Endpoint,
        packet: &Packet,
    ) -> Observed {
        let (key, direction) = SessionKey::classify(src, dst, self.server_port);
        let entry = self
            .sessions
            .entry(key)
            .or_insert_with(|| SessionEntry::new(ts));
        let duplicate_request = entry.observe(ts, direction, wire_len, packet);

        Observed {
            key,
            duplicate_request,
            connect_attempt: matches!(
                packet,
                Packet::Request {
                    action: RequestAction::Connect { .. },
                    ..
                }
            ),
        }
    }

    /// Drop idle sessions and enforce the session cap. Runs at most once
    /// per second of capture time; returns the number removed.
    pub fn maybe_expire(&mut self, now: f64) -> usize {
        if now - self.last_prune < 1.0 {
            return 0;
        }
        self.last_prune = now;

        let mut removed = 0;
        if self.timeout_secs > 0.0 {
            self.sessions.retain(|_, entry| {
                let keep = now - entry.last_seen <= self.timeout_secs;
                if !keep {
                    removed += 1;
                }
                keep
            });
        }

        if self.max_sessions > 0 && self.sessions.len() > self.max_sessions {
            let mut entries: Vec<(SessionKey, f64)> = self
                .sessions
                .iter()
                .map(|(key, entry)| (*key, entry.last_seen))
                .collect();
            entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            let excess = self.sessions.len() - self.max_sessions;
            for (key, _) in entries.into_iter().take(excess) {
                if self.sessions.remove(&key).is_some() {
                    removed += 1;
                }
            }
        }

        removed
    }

    /// Top-N sessions by bytes moved since their last report, resetting the
    /// report watermark for the returned sessions only.
    pub fn top_sessions_by_delta(&mut self, n: usize) -> Vec<SessionDelta> {
        if n == 0 {
            return Vec::new();
        }
        let mut deltas: Vec<SessionDelta> = self
            .sessions
            .iter()
            .filter_map(|(key, entry)| {
                let delta = entry.total_bytes().saturating_sub(entry.last_report_bytes);
                (delta > 0).then(|| SessionDelta {
                    key: *key,
                    delta_bytes: delta,
                })
            })
            .collect();
        deltas.sort_by(|a, b| b.delta_bytes.cmp(&a.delta_bytes));
        let top: Vec<SessionDelta> = deltas.into_iter().take(n).collect();
        for d in &top {
            if let Some(entry) = self.sessions.get_mut(&d.key) {
                entry.last_report_bytes = entry.total_bytes();
            }
        }
        top
    }

    /// All sessions, busiest first.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut sessions: Vec<SessionSnapshot> = self
            .sessions
            .iter()
            .map(|(key, entry)| SessionSnapshot::from_entry(key, entry))
            .collect();
        sessions.sort_by(|a, b| b.bytes_total.cmp(&a.bytes_total));
        sessions
    }
}

pub fn write_session_json(
    path: &Path,
    sessions: &[SessionSnapshot],
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, sessions)?;
    Ok(())
}

pub fn write_session_csv(
    path: &Path,
    sessions: &[SessionSnapshot],
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(
        writer,
        "client_ip,client_port,server_ip,server_port,first_seen,last_seen,duration_secs,\
         packets_to_server,packets_to_client,bytes_to_server,bytes_to_client,packets_total,bytes_total,\
         requests,responses,updates,update_replies,status_queries,status_reports,chat_messages,\
         response_errors,request_duplicates,request_late,request_gaps,\
         response_duplicates,response_late,response_gaps,\
         cookie,player_name,rtt_last_ms,rtt_min_ms,rtt_ewma_ms,rtt_samples"
    )?;
    for s in sessions {
        let rtt_last = s.rtt_last_ms.map(|v| format!("{:.3}", v)).unwrap_or_default();
        let rtt_min = s.rtt_min_ms.map(|v| format!("{:.3}", v)).unwrap_or_default();
        let rtt_ewma = s.rtt_ewma_ms.map(|v| format!("{:.3}", v)).unwrap_or_default();
        writeln!(
            writer,
            "{},{},{},{},{:.6},{:.6},{:.6},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_escape(&s.client.ip.to_string()),
            s.client.port,
            csv_escape(&s.server.ip.to_string()),
            s.server.port,
            s.first_seen,
            s.last_seen,
            s.duration_secs,
            s.packets_to_server,
            s.packets_to_client,
            s.bytes_to_server,
            s.bytes_to_client,
            s.packets_total,
            s.bytes_total,
            s.requests,
            s.responses,
            s.updates,
            s.update_replies,
            s.status_queries,
            s.status_reports,
            s.chat_messages,
            s.response_errors,
            s.request_duplicates,
            s.request_late,
            s.request_gaps,
            s.response_duplicates,
            s.response_late,
            s.response_gaps,
            csv_escape(s.cookie.as_deref().unwrap_or("")),
            csv_escape(s.player_name.as_deref().unwrap_or("")),
            rtt_last,
            rtt_min,
            rtt_ewma,
            s.rtt_samples
        )?;
    }
    Ok(())
}

/// Quote a CSV field when it contains a comma, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{PingPong, ResponseCode, DEFAULT_PORT};
    use std::net::Ipv4Addr;

    fn ep(last_octet: u8, port: u16) -> Endpoint {
        Endpoint {
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)),
            port,
        }
    }

    fn request(sequence: u64, action: RequestAction) -> Packet {
        Packet::Request {
            sequence,
            response_ack: None,
            cookie: None,
            action,
        }
    }

    #[test]
    fn both_directions_share_one_session() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(1.0, 100, client, server, &request(1, RequestAction::None));
        tracker.observe(
            1.1,
            80,
            server,
            client,
            &Packet::Response {
                sequence: 1,
                request_ack: Some(1),
                code: ResponseCode::Ok,
            },
        );

        assert_eq!(tracker.len(), 1);
        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.client, client);
        assert_eq!(snap.server, server);
        assert_eq!(snap.packets_to_server, 1);
        assert_eq!(snap.packets_to_client, 1);
        assert_eq!(snap.bytes_total, 180);
    }

    #[test]
    fn duplicate_request_sequence_is_counted() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(1.0, 60, client, server, &request(4, RequestAction::None));
        let obs = tracker.observe(1.2, 60, client, server, &request(4, RequestAction::None));
        assert!(obs.duplicate_request);

        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.request_duplicates, 1);
        assert_eq!(snap.request_late, 0);
    }

    #[test]
    fn sequence_gap_then_late_arrival() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(1.0, 60, client, server, &request(1, RequestAction::None));
        tracker.observe(1.1, 60, client, server, &request(4, RequestAction::None));
        tracker.observe(1.2, 60, client, server, &request(2, RequestAction::None));

        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.request_gaps, 2); // 2 and 3 were skipped
        assert_eq!(snap.request_late, 1);
        assert_eq!(snap.request_duplicates, 0);
    }

    #[test]
    fn status_ping_pong_yields_rtt() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(
            10.0,
            20,
            client,
            server,
            &Packet::GetStatus {
                ping: PingPong { nonce: 0x77 },
            },
        );
        tracker.observe(
            10.05,
            60,
            server,
            client,
            &Packet::Status {
                pong: PingPong { nonce: 0x77 },
                server_version: "0.3.4".into(),
                player_count: 0,
                room_count: 0,
                server_name: "west".into(),
            },
        );

        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.rtt_samples, 1);
        let rtt = snap.rtt_last_ms.unwrap();
        assert!((rtt - 50.0).abs() < 1.0, "rtt was {}", rtt);
    }

    #[test]
    fn unmatched_pong_is_ignored() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(
            10.0,
            60,
            server,
            client,
            &Packet::Status {
                pong: PingPong { nonce: 0x42 },
                server_version: "0.3.4".into(),
                player_count: 0,
                room_count: 0,
                server_name: "west".into(),
            },
        );
        assert_eq!(tracker.snapshot()[0].rtt_samples, 0);
    }

    #[test]
    fn logged_in_response_sets_cookie() {
        let client = ep(5, 54000);
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(
            1.0,
            90,
            client,
            server,
            &request(
                1,
                RequestAction::Connect {
                    name: "kivo".into(),
                    client_version: "0.3.4".into(),
                },
            ),
        );
        tracker.observe(
            1.1,
            90,
            server,
            client,
            &Packet::Response {
                sequence: 1,
                request_ack: Some(1),
                code: ResponseCode::LoggedIn {
                    cookie: "abc123".into(),
                    server_version: "0.3.4".into(),
                },
            },
        );

        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.cookie.as_deref(), Some("abc123"));
        assert_eq!(snap.player_name.as_deref(), Some("kivo"));
    }

    #[test]
    fn idle_sessions_expire() {
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 5.0, 1000);

        tracker.observe(1.0, 60, ep(5, 54000), server, &request(1, RequestAction::None));
        tracker.observe(100.0, 60, ep(6, 54001), server, &request(1, RequestAction::None));

        let removed = tracker.maybe_expire(100.0);
        assert_eq!(removed, 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.snapshot()[0].client, ep(6, 54001));
    }

    #[test]
    fn session_cap_evicts_oldest() {
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 0.0, 2);

        for i in 0..4u8 {
            tracker.observe(
                i as f64 * 10.0,
                60,
                ep(i + 1, 54000),
                server,
                &request(1, RequestAction::None),
            );
        }
        tracker.maybe_expire(40.0);
        assert_eq!(tracker.len(), 2);
        let snap = tracker.snapshot();
        assert!(snap.iter().all(|s| s.first_seen >= 20.0));
    }

    #[test]
    fn top_sessions_reports_deltas_once() {
        let server = ep(9, DEFAULT_PORT);
        let mut tracker = SessionTracker::new(DEFAULT_PORT, 60.0, 1000);

        tracker.observe(1.0, 500, ep(5, 54000), server, &request(1, RequestAction::None));
        tracker.observe(1.0, 100, ep(6, 54001), server, &request(1, RequestAction::None));

        let top = tracker.top_sessions_by_delta(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].delta_bytes, 500);

        // Reported session has no new bytes; the other still does.
        let top = tracker.top_sessions_by_delta(2);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].delta_bytes, 100);
    }
}
