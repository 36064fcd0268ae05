//! A datagram that answers the right seqno from the wrong source port is
//! ignored and reported through the warnings side-channel (spec.md §9),
//! while the real reply still completes the transaction.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use client::{EngineConfig, TransactionEngine, WarningKind};
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
async fn spoofed_reply_from_the_wrong_port_is_warned_and_ignored() {
    let port = spawn_server().await;
    let config = loopback_config(port);
    let (mut engine, mut warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let addr = Ipv4Addr::new(127, 0, 0, 1);
    engine.insert(addr).await.unwrap();

    let rogue = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client_addr = engine.local_addr().unwrap();
    rogue.send_to(b"999 OK\nbogus", client_addr).await.unwrap();

    let result = engine.status(Some(&[addr])).await;
    assert!(result.is_ok(), "the real reply must still complete the transaction: {result:?}");

    let warning = tokio::time::timeout(Duration::from_millis(200), warnings.recv())
        .await
        .expect("a wrong-port warning should have been emitted")
        .unwrap();
    assert_eq!(warning.kind, WarningKind::WrongPort);
    assert_eq!(warning.address, Ipv4Addr::new(127, 0, 0, 1));
}
