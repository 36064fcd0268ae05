use std::net::SocketAddr;
use std::time::Duration;

use protocol::{Command, ProtocolError, ResponseBody, Seqno, decode_response, encode_request};
use tokio::net::UdpSocket;

/// A bare request/response client for testing `server_board`'s dispatcher
/// without the full retry/registry machinery of `client_hub`'s engine.
pub struct MockUdpClient {
    socket: UdpSocket,
}

impl MockUdpClient {
    pub async fn bind() -> std::io::Result<Self> {
        Ok(MockUdpClient { socket: UdpSocket::bind("127.0.0.1:0").await? })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Send `command` and wait up to one second for a reply. Does not retry.
    pub async fn request(
        &self,
        dest: SocketAddr,
        seqno: Seqno,
        command: &Command,
    ) -> Result<(Seqno, ResponseBody), ProtocolError> {
        let payload = encode_request(seqno, command);
        self.socket.send_to(&payload, dest).await.map_err(|_| ProtocolError::EmptyDatagram)?;

        let mut buf = vec![0u8; 4096];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), self.socket.recv_from(&mut buf))
            .await
            .map_err(|_| ProtocolError::EmptyDatagram)?
            .map_err(|_| ProtocolError::EmptyDatagram)?;
        decode_response(&String::from_utf8_lossy(&buf[..n]))
    }

    /// Send a raw, pre-encoded line (for malformed-request tests).
    pub async fn send_raw(&self, dest: SocketAddr, line: &str) -> std::io::Result<()> {
        self.socket.send_to(line.as_bytes(), dest).await.map(|_| ())
    }
}
