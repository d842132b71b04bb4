use crate::frame::{ethernet::format_mac, FrameView, IpHeader};
use crate::wire::{self, Packet};
use std::net::IpAddr;

const HEX_DUMP_MAX: usize = 256;
const HEX_BYTES_PER_ROW: usize = 16;

/// Wall-clock HH:MM:SS.microseconds from a pcap epoch timestamp.
pub fn format_timestamp(ts: f64) -> String {
    let secs = ts as u64;
    let micros = ((ts - secs as f64) * 1_000_000.0) as u32;
    let day_secs = secs % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:06}",
        day_secs / 3600,
        (day_secs % 3600) / 60,
        day_secs % 60,
        micros
    )
}

/// One-line-per-packet view, endpoints and kinds aligned so the
/// describe strings column up when traffic is scrolling by.
pub fn summary_line(
    index: u64,
    ts: f64,
    src_ip: IpAddr,
    src_port: u16,
    dst_ip: IpAddr,
    dst_port: u16,
    packet: &Packet,
) -> String {
    format!(
        "{:>6} {} {:>15}:{:<5} -> {:>15}:{:<5} {:<11} {}",
        index,
        format_timestamp(ts),
        src_ip,
        src_port,
        dst_ip,
        dst_port,
        packet.kind().as_str(),
        wire::describe::info(packet)
    )
}

pub fn print_packet_summary(
    index: u64,
    ts: f64,
    src_ip: IpAddr,
    src_port: u16,
    dst_ip: IpAddr,
    dst_port: u16,
    packet: &Packet,
) {
    println!(
        "{}",
        summary_line(index, ts, src_ip, src_port, dst_ip, dst_port, packet)
    );
}

/// Full dissection: link and network layers, the decoded packet, and
/// an optional hex dump of the raw bytes.
pub fn print_packet_detail(
    index: u64,
    ts: f64,
    raw: &[u8],
    frame: &FrameView<'_>,
    packet: &Packet,
    hex_dump: bool,
) {
    println!("packet {} @ {} ({} bytes)", index, format_timestamp(ts), raw.len());
    println!(
        "  eth   {} -> {} (0x{:04x})",
        format_mac(frame.ethernet.src_mac()),
        format_mac(frame.ethernet.dst_mac()),
        frame.ethernet.ether_type_raw()
    );
    if let Some(vlan) = &frame.vlan {
        println!("  vlan  id {} priority {}", vlan.vlan_id, vlan.priority);
    }
    match &frame.network {
        Some(IpHeader::V4(ip)) => {
            println!(
                "  ipv4  {} -> {} ttl {} id 0x{:04x}{}",
                ip.src_addr(),
                ip.dst_addr(),
                ip.ttl(),
                ip.identification(),
                if ip.dont_fragment() { " DF" } else { "" }
            );
        }
        Some(IpHeader::V6(ip)) => {
            println!(
                "  ipv6  {} -> {} hops {}",
                ip.src_addr(),
                ip.dst_addr(),
                ip.hop_limit()
            );
        }
        None => {}
    }
    if let Some(udp) = &frame.udp {
        println!(
            "  udp   {} -> {} len {}",
            udp.src_port(),
            udp.dst_port(),
            udp.length()
        );
    }
    println!("  {:#?}", packet);
    if hex_dump {
        print_hex_dump(frame.payload);
    }
}

/// Failed decodes surface from the first `-v`; full dissection waits
/// for `-vv`.
pub fn show_decode_failures(verbose: u8) -> bool {
    verbose >= 1
}

/// Throughput accounting for the periodic `[stats]` line. `tick` is
/// driven by packet timestamps and by idle wakeups, so a report still
/// lands during a traffic lull.
pub struct StatsWindow {
    interval_secs: f64,
    window_start: Option<f64>,
    bytes: u64,
    packets: u64,
}

pub struct StatsReport {
    pub mbps: f64,
    pub pps: f64,
}

impl StatsWindow {
    pub fn new(interval_ms: u64) -> Self {
        StatsWindow {
            interval_secs: interval_ms as f64 / 1000.0,
            window_start: None,
            bytes: 0,
            packets: 0,
        }
    }

    pub fn record(&mut self, wire_len: u64) {
        self.packets += 1;
        self.bytes += wire_len;
    }

    /// Close the window and report if the interval has elapsed. A zero
    /// elapsed time never reports, so the rates stay finite even with
    /// a zero interval.
    pub fn tick(&mut self, now: f64) -> Option<StatsReport> {
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now - start;
        if elapsed < self.interval_secs || elapsed <= 0.0 {
            return None;
        }
        let report = StatsReport {
            mbps: self.bytes as f64 * 8.0 / elapsed / 1_000_000.0,
            pps: self.packets as f64 / elapsed,
        };
        self.window_start = Some(now);
        self.bytes = 0;
        self.packets = 0;
        Some(report)
    }
}

/// Shown from the first verbosity level; most decode failures are just
/// non-netwayste traffic that happened to share the port.
pub fn print_decode_failure(
    index: u64,
    ts: f64,
    src_ip: IpAddr,
    src_port: u16,
    dst_ip: IpAddr,
    dst_port: u16,
    payload: &[u8],
    error: &wire::DecodeError,
) {
    println!(
        "{:>6} {} {:>15}:{:<5} -> {:>15}:{:<5} undecodable ({} bytes): {}",
        index,
        format_timestamp(ts),
        src_ip,
        src_port,
        dst_ip,
        dst_port,
        payload.len(),
        error
    );
    print_hex_dump(payload);
}

fn print_hex_dump(data: &[u8]) {
    let shown = &data[..data.len().min(HEX_DUMP_MAX)];
    for (row, chunk) in shown.chunks(HEX_BYTES_PER_ROW).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if (0x20..0x7f).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!(
            "    {:04x}  {:<47}  |{}|",
            row * HEX_BYTES_PER_ROW,
            hex.join(" "),
            ascii
        );
    }
    if data.len() > HEX_DUMP_MAX {
        println!("    ... {} more bytes", data.len() - HEX_DUMP_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{PingPong, UniUpdate};
    use std::net::Ipv4Addr;

    #[test]
    fn summary_line_names_the_packet_kind() {
        let packet = Packet::Update {
            chats: Vec::new(),
            game_update_seq: Some(3),
            game_updates: Vec::new(),
            universe_update: UniUpdate::NoChange,
            ping: PingPong { nonce: 1 },
        };
        let line = summary_line(
            7,
            1.0,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            2016,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            40000,
            &packet,
        );
        assert!(line.contains("Update"), "line: {}", line);
        assert!(line.contains("10.0.0.1:2016"));
    }

    #[test]
    fn decode_failures_visible_from_first_verbose_level() {
        assert!(!show_decode_failures(0));
        assert!(show_decode_failures(1));
        assert!(show_decode_failures(2));
    }

    #[test]
    fn stats_tick_fires_during_a_lull() {
        let mut stats = StatsWindow::new(1000);
        assert!(stats.tick(10.0).is_none());
        // No packets recorded; an idle tick past the interval still
        // produces a (zero-rate) report.
        let report = stats.tick(11.5).unwrap();
        assert_eq!(report.pps, 0.0);
        assert_eq!(report.mbps, 0.0);
    }

    #[test]
    fn stats_rates_are_per_second() {
        let mut stats = StatsWindow::new(1000);
        stats.tick(0.0);
        stats.record(125_000);
        stats.record(125_000);
        let report = stats.tick(2.0).unwrap();
        assert!((report.mbps - 1.0).abs() < 1e-9);
        assert!((report.pps - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_interval_reports_nothing() {
        let mut stats = StatsWindow::new(0);
        stats.tick(5.0);
        stats.record(100);
        // Same timestamp again: no report, no infinite rates.
        assert!(stats.tick(5.0).is_none());
        let report = stats.tick(5.1).unwrap();
        assert!(report.mbps.is_finite());
        assert!(report.pps.is_finite());
    }

    #[test]
    fn timestamp_formats_microseconds() {
        // 01:02:03.500000 into some day.
        let ts = 86_400.0 * 3.0 + 3723.5;
        assert_eq!(format_timestamp(ts), "01:02:03.500000");
    }

    #[test]
    fn timestamp_wraps_at_midnight() {
        assert_eq!(format_timestamp(86_400.0), "00:00:00.000000");
    }
}
