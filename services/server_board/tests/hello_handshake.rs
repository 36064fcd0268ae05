//! `HELLO` binds the server to a client and returns `VERSION <v>`; a second
//! `HELLO` with a non-increasing client-time is rejected (spec.md §4.4, §8).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use camera::MockCamera;
use repeater::RepeaterConfig;
use server::Dispatcher;
use tokio::net::UdpSocket;

async fn spawn_server() -> SocketAddr {
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let addr = socket.local_addr().unwrap();
    let camera = Arc::new(MockCamera::new());
    let config = RepeaterConfig { interval_max: Duration::from_millis(20), deadline: Duration::from_secs(2) };
    let mut dispatcher = Dispatcher::new(socket, camera, config);
    tokio::spawn(async move { dispatcher.run().await });
    addr
}

async fn recv_line(client: &UdpSocket) -> String {
    let mut buf = [0u8; 2048];
    let (n, _) = tokio::time::timeout(Duration::from_millis(500), client.recv_from(&mut buf))
        .await
        .expect("response within timeout")
        .unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

#[tokio::test]
async fn hello_binds_client_and_returns_version() {
    let server_addr = spawn_server().await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"1 HELLO 1000.0", server_addr).await.unwrap();

    let response = recv_line(&client).await;
    assert_eq!(response, "1 OK\nVERSION 1.0");
}

#[tokio::test]
async fn second_hello_with_non_increasing_time_is_rejected() {
    let server_addr = spawn_server().await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    client.send_to(b"1 HELLO 1000.0", server_addr).await.unwrap();
    let _ = recv_line(&client).await;

    client.send_to(b"2 HELLO 1000.0", server_addr).await.unwrap();
    let response = recv_line(&client).await;
    assert!(response.starts_with("2 ERROR"), "got: {response}");
}
