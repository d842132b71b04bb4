use clap::Parser;
use nwscope::analysis::{AlertSink, HealthMonitor};
use nwscope::capture::{self, PacketSource};
use nwscope::cli::Cli;
use nwscope::config::{Config, ConfigError};
use nwscope::display;
use nwscope::frame;
use nwscope::session::{self, Endpoint, SessionTracker};
use nwscope::wire;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    if cli.list_interfaces {
        match capture::list_interfaces() {
            Ok(interfaces) => {
                for (name, desc) in interfaces {
                    match desc {
                        Some(desc) => println!("{:<16} {}", name, desc),
                        None => println!("{}", name),
                    }
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    let verbose = cli.verbose;
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    }) {
        warn!(error = %err, "could not install signal handler");
    }

    if let Err(err) = run_capture(&config, verbose, &running) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

/// Config file values first, then any flag the user actually passed.
fn load_config(cli: Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(interface) = cli.interface {
        config.capture.interface = Some(interface);
    }
    if let Some(port) = cli.port {
        config.capture.port = port;
    }
    if let Some(filter) = cli.filter {
        config.capture.filter = Some(filter);
    }
    if let Some(snaplen) = cli.snaplen {
        config.capture.snaplen = snaplen;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.capture.timeout_ms = timeout_ms;
    }
    if cli.promiscuous {
        config.capture.promiscuous = true;
    }
    if cli.no_promiscuous {
        config.capture.promiscuous = false;
    }

    if let Some(count) = cli.count {
        config.run.count = count;
    }
    if let Some(read) = cli.read {
        config.run.read_file = Some(read);
    }

    if let Some(path) = cli.write_pcap {
        config.output.write_pcap = Some(path);
    }
    if let Some(path) = cli.export_json {
        config.output.export_json = Some(path);
    }
    if let Some(path) = cli.export_csv {
        config.output.export_csv = Some(path);
    }
    if cli.hex_dump {
        config.output.hex_dump = true;
    }
    if cli.quiet {
        config.output.quiet = true;
    }

    if let Some(timeout) = cli.session_timeout_s {
        config.session.timeout_secs = timeout;
    }
    if let Some(max) = cli.max_sessions {
        config.session.max_sessions = max;
    }

    if cli.stats {
        config.stats.enabled = true;
    }
    if cli.no_stats {
        config.stats.enabled = false;
    }
    if let Some(interval) = cli.stats_interval_ms {
        config.stats.interval_ms = interval;
    }
    if let Some(n) = cli.top_sessions {
        config.stats.top_sessions = n;
    }

    if cli.health {
        config.analysis.health.enabled = true;
    }
    if cli.no_health {
        config.analysis.health.enabled = false;
    }
    if let Some(path) = cli.alerts_jsonl {
        if path.as_os_str().is_empty() {
            config.analysis.alerts_jsonl = None;
        } else {
            config.analysis.alerts_jsonl = Some(path);
        }
    }

    Ok(config)
}

fn run_capture(
    config: &Config,
    verbose: u8,
    running: &Arc<AtomicBool>,
) -> Result<(), Box<dyn Error>> {
    let mut source = match &config.run.read_file {
        Some(path) => PacketSource::File(capture::open_savefile(path, &config.capture)?),
        None => PacketSource::Live(capture::open_capture(&config.capture)?),
    };

    let mut savefile = match &config.output.write_pcap {
        Some(path) => {
            info!(file = %path.display(), "writing captured packets");
            Some(source.savefile(path)?)
        }
        None => None,
    };

    let mut tracker = SessionTracker::new(
        config.capture.port,
        config.session.timeout_secs,
        config.session.max_sessions,
    );
    let mut health = HealthMonitor::new(config.analysis.health.clone());
    let mut alert_sink = match &config.analysis.alerts_jsonl {
        Some(path) => Some(AlertSink::open(path)?),
        None => None,
    };

    let mut packets: u64 = 0;
    let mut datagrams: u64 = 0;
    let mut decoded: u64 = 0;
    let mut decode_failures: u64 = 0;
    let mut parse_errors: u64 = 0;
    let mut skipped: u64 = 0;

    let mut stats = display::StatsWindow::new(config.stats.interval_ms);

    while running.load(Ordering::SeqCst) {
        if config.run.count > 0 && packets >= config.run.count {
            break;
        }

        let packet = match source.next_packet() {
            Ok(packet) => packet,
            Err(pcap::Error::TimeoutExpired) => {
                // Idle tick: sessions still expire and the stats line
                // still lands during a lull. Live capture timestamps
                // are wall clock, so the clocks agree.
                let now = wall_clock();
                tracker.maybe_expire(now);
                if config.stats.enabled {
                    emit_stats(&mut stats, now, &mut tracker, config.stats.top_sessions);
                }
                continue;
            }
            Err(pcap::Error::NoMorePackets) => break,
            Err(err) => return Err(Box::new(err)),
        };

        let ts = packet.header.ts.tv_sec as f64 + packet.header.ts.tv_usec as f64 / 1_000_000.0;
        packets += 1;

        if let Some(savefile) = &mut savefile {
            savefile.write(&packet);
        }

        let frame = match frame::parse_frame(packet.data) {
            Ok(frame) => frame,
            Err(err) => {
                parse_errors += 1;
                debug!(error = %err, caplen = packet.header.caplen, "unparseable frame");
                continue;
            }
        };

        let Some((src_ip, src_port, dst_ip, dst_port)) = frame.udp_endpoints() else {
            skipped += 1;
            continue;
        };
        if src_port != config.capture.port && dst_port != config.capture.port {
            skipped += 1;
            continue;
        }

        datagrams += 1;
        stats.record(packet.header.len as u64);

        match wire::decode(frame.payload) {
            Ok(decoded_packet) => {
                decoded += 1;
                if !config.output.quiet {
                    if config.output.hex_dump || verbose >= 2 {
                        display::print_packet_detail(
                            datagrams,
                            ts,
                            packet.data,
                            &frame,
                            &decoded_packet,
                            config.output.hex_dump,
                        );
                    } else {
                        display::print_packet_summary(
                            datagrams,
                            ts,
                            src_ip,
                            src_port,
                            dst_ip,
                            dst_port,
                            &decoded_packet,
                        );
                    }
                }

                let observed = tracker.observe(
                    ts,
                    packet.header.len as u64,
                    Endpoint {
                        ip: src_ip,
                        port: src_port,
                    },
                    Endpoint {
                        ip: dst_ip,
                        port: dst_port,
                    },
                    &decoded_packet,
                );
                for alert in health.observe(ts, &observed) {
                    println!(
                        "[alert] {} {} {}",
                        display::format_timestamp(alert.ts),
                        alert.kind.as_str(),
                        alert.description
                    );
                    if let Some(sink) = &mut alert_sink {
                        sink.write(&alert);
                    }
                }
            }
            Err(err) => {
                decode_failures += 1;
                if display::show_decode_failures(verbose) {
                    display::print_decode_failure(
                        datagrams,
                        ts,
                        src_ip,
                        src_port,
                        dst_ip,
                        dst_port,
                        frame.payload,
                        &err,
                    );
                }
            }
        }

        tracker.maybe_expire(ts);

        if config.stats.enabled {
            emit_stats(&mut stats, ts, &mut tracker, config.stats.top_sessions);
        }
    }

    print_summary(packets, datagrams, decoded, decode_failures, parse_errors, skipped);

    if config.output.export_json.is_some() || config.output.export_csv.is_some() {
        let snapshot = tracker.snapshot();
        if let Some(path) = &config.output.export_json {
            session::write_session_json(path, &snapshot)?;
            info!(file = %path.display(), sessions = snapshot.len(), "wrote session JSON");
        }
        if let Some(path) = &config.output.export_csv {
            session::write_session_csv(path, &snapshot)?;
            info!(file = %path.display(), sessions = snapshot.len(), "wrote session CSV");
        }
    }

    Ok(())
}

fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn emit_stats(
    stats: &mut display::StatsWindow,
    now: f64,
    tracker: &mut SessionTracker,
    top_sessions: u32,
) {
    let Some(report) = stats.tick(now) else {
        return;
    };
    println!(
        "[stats] {:.2} Mbps | {:.0} pps | {} sessions",
        report.mbps,
        report.pps,
        tracker.len()
    );
    for delta in tracker.top_sessions_by_delta(top_sessions as usize) {
        println!(
            "[stats]   {} <-> {} +{} bytes",
            delta.key.client, delta.key.server, delta.delta_bytes
        );
    }
}

fn print_summary(
    packets: u64,
    datagrams: u64,
    decoded: u64,
    decode_failures: u64,
    parse_errors: u64,
    skipped: u64,
) {
    println!("{}", "=".repeat(50));
    println!("capture summary");
    println!("  packets seen:        {}", packets);
    println!("  netwayste datagrams: {}", datagrams);
    println!("  decoded:             {}", decoded);
    println!("  decode failures:     {}", decode_failures);
    if parse_errors > 0 {
        println!("  unparseable frames:  {}", parse_errors);
    }
    if skipped > 0 {
        println!("  skipped (non-udp):   {}", skipped);
    }
    if datagrams > 0 {
        println!(
            "  decode success:      {:.1}%",
            decoded as f64 * 100.0 / datagrams as f64
        );
    }
    println!("{}", "=".repeat(50));
}
