use bytes::Bytes;
use dtp_core::{frame_tagged, with_preamble, ServerBuilder, StatusCode, TagFraming};
use dtp_transport::{client, DtpServer};

fn print_request(packet: Bytes) -> StatusCode {
    tracing::info!("PrintRequest: {}", String::from_utf8_lossy(&packet));
    StatusCode::SUCCESS
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Tag-prefixed server answering three tags, torn down cleanly after a few requests.
    let builder = ServerBuilder::new()
        .with_host("127.0.0.1")
        .with_port(0)
        .with_thread_pool_size(4)
        .with_blocking_execution(false)
        .with_tag_framing(TagFraming::Prefixed)
        .route(1, print_request)
        .route(7, |_: Bytes| StatusCode::new(0x8000_0001))
        .route(
            9,
            with_preamble(|packet: Bytes, out: &mut dyn std::io::Write| {
                match out.write_all(&packet) {
                    Ok(()) => StatusCode::SUCCESS,
                    Err(_) => StatusCode::FAIL,
                }
            }),
        );

    let mut server = DtpServer::new("MetadataServer");
    server.init(Some(builder))?;
    server.run()?;

    let addr = server.local_addr().ok_or("server has no address")?;
    for (tag, message) in [(1u32, "Hello, Server"), (7, "rejected"), (9, "echo"), (42, "nobody home")] {
        let status = client::transmit(addr, &frame_tagged(tag, message.as_bytes()))?;
        println!("tag {:>2} -> {:?}", tag, status);
    }

    server.stop()?;
    server.join();
    Ok(())
}
