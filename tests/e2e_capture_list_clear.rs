//! Scenario from spec.md §8: `CAPTURE n` followed by `LIST` returns exactly
//! `n` sequential `IMAGE` entries, and `CLEAR` empties the store again.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use client::{EngineConfig, TransactionEngine};
use protocol::FileType;
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
        request_timeout: Duration::from_millis(300),
        retry_interval: Duration::from_millis(20),
        tcp_bind_addr: "127.0.0.1".to_owned(),
        tcp_port: 0,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn capture_then_list_then_clear_round_trips() {
    let port = spawn_server().await;
    let config = loopback_config(port);
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let addr = Ipv4Addr::new(127, 0, 0, 1);
    engine.insert(addr).await.unwrap();

    engine.capture(None, 3, false, None, None).await.unwrap();

    let listings = engine.list_(None).await.unwrap();
    let entries = listings.get(&addr).expect("the camera's listing should be present");
    assert_eq!(entries.len(), 3);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.file_type, FileType::Image);
        assert_eq!(entry.index, i as u32);
    }

    engine.clear(None).await.unwrap();

    let listings = engine.list_(None).await.unwrap();
    assert!(listings.get(&addr).unwrap().is_empty());
}
