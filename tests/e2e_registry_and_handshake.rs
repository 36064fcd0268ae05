//! Scenario 1 from spec.md §8: a `HELLO` handshake against a real
//! dispatcher, both through the engine's `insert` and at the raw wire
//! level.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use client::{EngineConfig, TransactionEngine};
use repeater::RepeaterConfig;
use server::Dispatcher;
use test_support::MockUdpClient;
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
async fn hello_on_the_wire_matches_the_documented_grammar() {
    let port = spawn_server().await;
    let raw = MockUdpClient::bind().await.unwrap();

    let dest = format!("127.0.0.1:{port}").parse().unwrap();
    let (seqno, body) = raw
        .request(dest, protocol::Seqno(1), &protocol::Command::Hello { timestamp: 1000.0 })
        .await
        .unwrap();

    assert_eq!(seqno, protocol::Seqno(1));
    assert_eq!(body, protocol::ResponseBody::Ok(Some("VERSION 1.0".to_owned())));
}

#[tokio::test]
async fn insert_registers_the_address_after_a_successful_handshake() {
    let port = spawn_server().await;
    let config = loopback_config(port);
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let addr = Ipv4Addr::new(127, 0, 0, 1);
    engine.insert(addr).await.unwrap();

    assert_eq!(engine.registry().as_slice(), &[addr]);
}
