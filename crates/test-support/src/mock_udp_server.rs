use std::net::SocketAddr;
use std::sync::Arc;

use protocol::{Command, ResponseBody, Seqno, decode_request, encode_response};
use tokio::net::UdpSocket;

/// A scripted UDP server for testing `client` against known request/response
/// behavior without a real [`Dispatcher`](../server/struct.Dispatcher.html).
///
/// Binds to `127.0.0.1:0` and answers every well-formed datagram with
/// whatever `respond` returns, once, with no retry semantics of its own —
/// callers that need idempotence or repeater behavior test against the real
/// server instead.
pub struct MockUdpServer {
    addr: SocketAddr,
    _task: tokio::task::JoinHandle<()>,
}

impl MockUdpServer {
    pub async fn start<F>(respond: F) -> std::io::Result<Self>
    where
        F: Fn(Seqno, Command) -> ResponseBody + Send + Sync + 'static,
    {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await?);
        let addr = socket.local_addr()?;
        let respond = Arc::new(respond);

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((n, src)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let line = String::from_utf8_lossy(&buf[..n]);
                let Ok((seqno, command)) = decode_request(&line) else {
                    continue;
                };
                let body = respond(seqno, command);
                let reply = encode_response(seqno, &body);
                let _ = socket.send_to(&reply, src).await;
            }
        });

        Ok(MockUdpServer { addr, _task: task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
