//! Registry commit/duplicate-rejection and the `HELLO` handshake gate
//! (spec.md §4.6, §8).

use std::net::Ipv4Addr;
use std::time::Duration;

use client::{EngineConfig, TransactionEngine};
use protocol::{Command, ResponseBody};
use test_support::MockUdpServer;

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
async fn insert_commits_after_successful_handshake() {
    let server = MockUdpServer::start(|_seqno, command| match command {
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 1.0".to_owned())),
        _ => ResponseBody::Error("unexpected".to_owned()),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    engine.insert(server_ip).await.unwrap();
    assert!(engine.registry().contains(server_ip));
}

#[tokio::test]
async fn insert_rejects_duplicate_address() {
    let server = MockUdpServer::start(|_seqno, command| match command {
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 1.0".to_owned())),
        _ => ResponseBody::Error("unexpected".to_owned()),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    engine.insert(server_ip).await.unwrap();
    let err = engine.insert(server_ip).await.unwrap_err();
    assert!(matches!(err, client::TransactionError::RedefinedServer(addr) if addr == server_ip));
}

#[tokio::test]
async fn insert_fails_on_version_mismatch() {
    let server = MockUdpServer::start(|_seqno, command| match command {
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 9.9".to_owned())),
        _ => ResponseBody::Error("unexpected".to_owned()),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let err = engine.insert(server_ip).await.unwrap_err();
    assert!(matches!(err, client::TransactionError::TransactionFailed { .. }));
    assert!(!engine.registry().contains(server_ip));
}

#[tokio::test]
async fn remove_is_silent_and_untracked() {
    let server = MockUdpServer::start(|_seqno, command| match command {
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 1.0".to_owned())),
        _ => ResponseBody::Error("unexpected".to_owned()),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    engine.insert(server_ip).await.unwrap();
    assert!(engine.remove(server_ip));
    assert!(!engine.registry().contains(server_ip));
}
