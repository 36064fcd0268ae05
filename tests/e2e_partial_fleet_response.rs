//! Two registered cameras, one of which goes offline before a fleet-wide
//! command: the transaction fails as a whole, but the per-address failure
//! list singles out only the unreachable one (spec.md §7, §8).

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use client::{EngineConfig, PeerError, TransactionEngine, TransactionError};
use repeater::RepeaterConfig;
use server::Dispatcher;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Spawn a dispatcher bound to `bind_ip:port` — every camera on a real
/// subnet listens on the same control port, distinguished only by address,
/// so the two servers in this test must share one port number too.
async fn spawn_server(bind_ip: &str, port: u16) -> JoinHandle<()> {
    let socket = Arc::new(UdpSocket::bind(format!("{bind_ip}:{port}")).await.unwrap());
    let camera = Arc::new(MockCamera::new());
    let repeater_config =
        RepeaterConfig { interval_max: Duration::from_millis(20), deadline: Duration::from_millis(500) };
    let mut dispatcher = Dispatcher::new(socket, camera, repeater_config);
    tokio::spawn(async move { dispatcher.run().await })
}

fn loopback_config(server_port: u16) -> EngineConfig {
    EngineConfig {
        udp_network: Ipv4Addr::new(127, 0, 0, 0),
        udp_prefix_len: 24,
        udp_port: server_port,
        request_timeout: Duration::from_millis(300),
        retry_interval: Duration::from_millis(20),
        tcp_bind_addr: "127.0.0.1".to_owned(),
        tcp_port: 0,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn one_unreachable_camera_is_isolated_in_the_failure_list() {
    // Discover a free port by letting the OS assign one, then reuse that
    // number explicitly on the second loopback address.
    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let _handle_a = spawn_server("127.0.0.1", port).await;
    let handle_b = spawn_server("127.0.0.2", port).await;

    let addr_a = Ipv4Addr::new(127, 0, 0, 1);
    let addr_b = Ipv4Addr::new(127, 0, 0, 2);

    let config = loopback_config(port);
    let (mut engine, _warnings) = TransactionEngine::bind(config, "1.0").await.unwrap();

    engine.insert(addr_a).await.unwrap();
    engine.insert(addr_b).await.unwrap();

    // Camera B goes offline before the next round.
    handle_b.abort();

    let err = engine.status(Some(&[addr_a, addr_b])).await.unwrap_err();
    let TransactionError::TransactionFailed { failures, total } = err else {
        panic!("expected TransactionFailed, got {err:?}");
    };
    assert_eq!(total, 2);
    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0], PeerError::MissingResponse { address } if *address == addr_b));
}
