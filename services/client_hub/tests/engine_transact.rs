//! `TransactionEngine::transact` and its typed wrappers against a scripted
//! server (spec.md §4.6, §8).

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
        request_timeout: Duration::from_millis(500),
        retry_interval: Duration::from_millis(20),
        tcp_bind_addr: "127.0.0.1".to_owned(),
        tcp_port: 0,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn status_command_round_trips_through_engine() {
    let snapshot_text = "RESOLUTION 1280,720\nFRAMERATE 30/1\nAWB auto,14/10,15/10\nAGC auto,1/1,1/1\nEXPOSURE auto,0\nISO 100\nMETERING average\nBRIGHTNESS 50\nCONTRAST 0\nSATURATION 0\nEV 0\nFLIP 1,0\nDENOISE 0\nTIMESTAMP 1700000000\nFILES 0";
    let server = MockUdpServer::start(move |_seqno, command| match command {
        Command::Status => ResponseBody::Ok(Some(snapshot_text.to_owned())),
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 1.0".to_owned())),
        Command::Ack => ResponseBody::Ok(None),
        _ => ResponseBody::Error("unexpected".to_owned()),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();
    engine.insert(server_ip).await.unwrap();

    let statuses = engine.status(None).await.unwrap();
    let snapshot = statuses.get(&server_ip).expect("server answered");
    assert_eq!(snapshot.resolution, (1280, 720));
    assert_eq!(snapshot.iso, 100);
}

#[tokio::test]
async fn server_error_surfaces_as_transaction_failed() {
    let server = MockUdpServer::start(|_seqno, command| match command {
        Command::Hello { .. } => ResponseBody::Ok(Some("VERSION 1.0".to_owned())),
        Command::Clear => ResponseBody::Error("no files to clear".to_owned()),
        _ => ResponseBody::Ok(None),
    })
    .await
    .unwrap();

    let server_ip = Ipv4Addr::new(127, 0, 0, 1);
    let config = loopback_config(server.local_addr().port());
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();
    engine.insert(server_ip).await.unwrap();

    let err = engine.clear(None).await.unwrap_err();
    match err {
        client::TransactionError::TransactionFailed { failures, total } => {
            assert_eq!(total, 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].address(), server_ip);
        }
        other => panic!("expected TransactionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_target_times_out_as_missing_response() {
    // A bound UDP socket with nobody listening behind it never answers.
    let parked = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dead_port = parked.local_addr().unwrap().port();
    drop(parked);

    let config = EngineConfig {
        udp_network: Ipv4Addr::new(127, 0, 0, 1),
        udp_prefix_len: 32,
        udp_port: dead_port,
        request_timeout: Duration::from_millis(150),
        retry_interval: Duration::from_millis(20),
        tcp_bind_addr: "127.0.0.1".to_owned(),
        tcp_port: 0,
        ..EngineConfig::default()
    };
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    let err = engine.insert(Ipv4Addr::new(127, 0, 0, 1)).await.unwrap_err();
    match err {
        client::TransactionError::TransactionFailed { failures, .. } => {
            assert!(matches!(failures[0], client::PeerError::MissingResponse { .. }));
        }
        other => panic!("expected TransactionFailed, got {other:?}"),
    }
}
