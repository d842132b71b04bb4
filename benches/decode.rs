use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nwscope::frame;
use nwscope::session::{Endpoint, SessionTracker};
use nwscope::wire::{self, Packet, RequestAction};
use std::net::{IpAddr, Ipv4Addr};

/// Minimal ethernet + IPv4 + UDP frame carrying `payload`.
fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(42 + payload.len());
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x01]);
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x02]);
    frame.extend_from_slice(&0x0800u16.to_be_bytes());

    let ip_total = 20 + 8 + payload.len() as u16;
    frame.push(0x45);
    frame.push(0);
    frame.extend_from_slice(&ip_total.to_be_bytes());
    frame.extend_from_slice(&[0, 0, 0x40, 0, 64, 17, 0, 0]);
    frame.extend_from_slice(&[10, 0, 0, 1]);
    frame.extend_from_slice(&[10, 0, 0, 2]);

    frame.extend_from_slice(&src_port.to_be_bytes());
    frame.extend_from_slice(&dst_port.to_be_bytes());
    frame.extend_from_slice(&(8 + payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

fn sample_packet() -> Packet {
    Packet::Request {
        sequence: 42,
        response_ack: Some(41),
        cookie: Some("deadbeef".to_string()),
        action: RequestAction::KeepAlive { latest_response_ack: 41 },
    }
}

fn bench_parse_frame(c: &mut Criterion) {
    let payload = wire::encode(&sample_packet()).unwrap();
    let raw = udp_frame(40000, wire::DEFAULT_PORT, &payload);

    let mut group = c.benchmark_group("frame");
    group.throughput(Throughput::Elements(1));
    group.bench_function("parse_frame", |b| {
        b.iter(|| frame::parse_frame(black_box(&raw)).unwrap())
    });
    group.finish();
}

fn bench_wire_decode(c: &mut Criterion) {
    let payload = wire::encode(&sample_packet()).unwrap();

    let mut group = c.benchmark_group("wire");
    group.throughput(Throughput::Elements(1));
    group.bench_function("decode", |b| {
        b.iter(|| wire::decode(black_box(&payload)).unwrap())
    });
    group.finish();
}

fn bench_session_observe(c: &mut Criterion) {
    let packet = sample_packet();
    let client = Endpoint {
        ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        port: 40000,
    };
    let server = Endpoint {
        ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        port: wire::DEFAULT_PORT,
    };

    let mut group = c.benchmark_group("session");
    group.throughput(Throughput::Elements(1));
    group.bench_function("observe", |b| {
        let mut tracker = SessionTracker::new(wire::DEFAULT_PORT, 120.0, 10_000);
        let mut ts = 0.0;
        b.iter(|| {
            ts += 0.001;
            tracker.observe(ts, 100, black_box(client), black_box(server), black_box(&packet))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse_frame, bench_wire_decode, bench_session_observe);
criterion_main!(benches);
