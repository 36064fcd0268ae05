//! `CAPTURE` with `sync` set but `quality` left at its default must still
//! reach the wire intact — the typed `capture()` wrapper does not go
//! through `decode_request`, so a caller can legally set one without the
//! other (spec.md §4.4's CAPTURE grammar).

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use client::{EngineConfig, TransactionEngine};
use repeater::RepeaterConfig;
use server::Dispatcher;
use tokio::net::UdpSocket;

async fn spawn_server() -> u16 {
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let port = socket.local_addr().unwrap().port();
    let camera = Arc::new(MockCamera::new());
    let repeater_config =
        RepeaterConfig { interval_max: Duration::from_millis(20), deadline: Duration::from_millis(500) };
    let mut dispatcher = Dispatcher::new(socket, camera, repeater_config);
    tokio::spawn(async move { dispatcher.run().await });
    port
}

fn loopback_config(server_port: u16) -> EngineConfig {
    EngineConfig {
        udp_network: Ipv4Addr::new(127, 0, 0, 1),
        udp_prefix_len: 32,
        udp_port: server_port,
        request_timeout: Duration::from_millis(500),
        retry_interval: Duration::from_millis(20),
        tcp_bind_addr: "127.0.0.1".to_owned(),
        tcp_port: 0,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn capture_with_sync_but_no_quality_still_captures() {
    let port = spawn_server().await;
    let config = loopback_config(port);
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let addr = Ipv4Addr::new(127, 0, 0, 1);
    engine.insert(addr).await.unwrap();

    let sync_at = client::time::now_unix() + 0.05;
    engine.capture(None, 1, false, None, Some(sync_at)).await.unwrap();

    let listings = engine.list_(None).await.unwrap();
    let entries = listings.get(&addr).expect("the camera's listing should be present");
    assert_eq!(entries.len(), 1);
}
