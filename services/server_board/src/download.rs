//! `SEND`: open an outbound TCP connection to the client's download
//! listener and write one length-prefixed file (spec.md §4.7).
//!
//! This runs on its own task, separate from the dispatcher's datagram loop
//! (spec.md §5) — the UDP `OK` for `SEND` is returned as soon as the
//! transfer is handed off, not after the (potentially tens-of-seconds-long)
//! TCP write completes.

use std::net::{IpAddr, SocketAddr};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::HandlerError;

pub async fn send_file(payload: Vec<u8>, client_ip: IpAddr, port: u16) -> Result<(), HandlerError> {
    let dest = SocketAddr::new(client_ip, port);

    let mut stream = TcpStream::connect(dest)
        .await
        .map_err(|error| HandlerError::SendConnect(error.to_string()))?;

    let len = payload.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .await
        .map_err(|error| HandlerError::SendConnect(error.to_string()))?;
    stream
        .write_all(&payload)
        .await
        .map_err(|error| HandlerError::SendConnect(error.to_string()))?;
    let _ = stream.shutdown().await;
    Ok(())
}
