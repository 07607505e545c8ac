use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dtp_core::{frame_tagged, ServerBuilder, StatusCode, TagFraming};
use dtp_transport::{client, codec, DtpServer};

fn status_codec(c: &mut Criterion) {
    c.bench_function("encode_status", |b| {
        b.iter(|| codec::encode_status(black_box(StatusCode::UNKNOWN_PACKET_TAG)))
    });
}

fn loopback_round_trip(c: &mut Criterion) {
    let mut server = DtpServer::new("bench");
    server
        .init(Some(
            ServerBuilder::new()
                .with_host("127.0.0.1")
                .with_port(0)
                .with_thread_pool_size(4)
                .with_blocking_execution(false)
                .with_tag_framing(TagFraming::Prefixed)
                .route(1, |_: Bytes| StatusCode::SUCCESS),
        ))
        .unwrap();
    server.run().unwrap();
    let addr = server.local_addr().unwrap();
    let packet = frame_tagged(1, b"bench payload");

    c.bench_function("loopback_round_trip", |b| {
        b.iter(|| client::transmit(addr, black_box(&packet)).unwrap())
    });
    c.bench_function("loopback_unknown_tag", |b| {
        let unknown = frame_tagged(99, b"x");
        b.iter(|| client::transmit(addr, black_box(&unknown)).unwrap())
    });

    server.stop().unwrap();
    server.join();
}

criterion_group!(benches, status_codec, loopback_round_trip);
criterion_main!(benches);
