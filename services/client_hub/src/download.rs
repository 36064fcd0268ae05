//! `SEND`: a small length-prefixed TCP listener that accepts exactly one
//! inbound file transfer per armed [`DownloadReceiver::receive`] call
//! (spec.md §4.7).

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::{TransactionError, Warning, WarningKind};

struct PendingDownload {
    expected_source: Ipv4Addr,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    completion: oneshot::Sender<Result<(), TransactionError>>,
}

/// Owns the client's inbound TCP port for `SEND` transfers. One connection
/// is serviced at a time; a connection from any address other than the one
/// currently armed is rejected with a warning and left for the real sender.
///
/// Cheap to clone: every clone shares the same accept loop and pending-slot
/// state, which lets [`crate::engine::TransactionEngine::download`] hold its
/// own handle alongside a concurrent `&mut self` call into the engine.
#[derive(Clone)]
pub struct DownloadReceiver {
    pending: Arc<Mutex<Option<PendingDownload>>>,
    local_port: u16,
}

impl DownloadReceiver {
    pub async fn bind(bind_addr: &str, warnings: mpsc::UnboundedSender<Warning>) -> Result<Self, TransactionError> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| TransactionError::UdpBind { addr: bind_addr.to_owned(), source })?;
        let local_port = listener
            .local_addr()
            .map_err(|source| TransactionError::UdpBind { addr: bind_addr.to_owned(), source })?
            .port();

        let pending = Arc::new(Mutex::new(None));
        let accept_pending = pending.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, peer)) = listener.accept().await else {
                    break;
                };
                let pending = accept_pending.clone();
                let warnings = warnings.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer, pending, warnings).await;
                });
            }
        });

        Ok(DownloadReceiver { pending, local_port })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Arm the receiver for a transfer from `expected_source`, and block
    /// until it completes or `timeout` elapses.
    pub async fn receive(
        &self,
        expected_source: Ipv4Addr,
        writer: impl AsyncWrite + Unpin + Send + 'static,
        timeout: Duration,
    ) -> Result<(), TransactionError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut guard = self.pending.lock().await;
            *guard = Some(PendingDownload { expected_source, writer: Box::new(writer), completion: tx });
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransactionError::SendTimeout),
            Err(_) => {
                self.pending.lock().await.take();
                Err(TransactionError::SendTimeout)
            }
        }
    }
}

async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
    pending: Arc<Mutex<Option<PendingDownload>>>,
    warnings: mpsc::UnboundedSender<Warning>,
) {
    let std::net::SocketAddr::V4(peer_v4) = peer else {
        return;
    };

    let mismatched = {
        let guard = pending.lock().await;
        match guard.as_ref() {
            Some(entry) => entry.expected_source != *peer_v4.ip(),
            None => true,
        }
    };
    if mismatched {
        // Leave the slot armed; the real sender may still connect.
        warn_unknown_source(&warnings, *peer_v4.ip());
        return;
    }

    let entry = pending.lock().await.take();
    let Some(PendingDownload { writer, completion, .. }) = entry else {
        return;
    };

    let result = read_length_prefixed(&mut stream, writer).await;
    let _ = completion.send(result);
}

async fn read_length_prefixed(
    stream: &mut tokio::net::TcpStream,
    mut writer: Box<dyn AsyncWrite + Unpin + Send>,
) -> Result<(), TransactionError> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|_| TransactionError::SendTruncated { expected: 0, actual: 0 })?;
    let expected = u32::from_le_bytes(len_buf);

    let mut remaining = expected as u64;
    let mut chunk = [0u8; 8192];
    while remaining > 0 {
        let want = chunk.len().min(remaining as usize);
        let n = stream
            .read(&mut chunk[..want])
            .await
            .map_err(|_| TransactionError::SendTruncated { expected, actual: expected - remaining as u32 })?;
        if n == 0 {
            return Err(TransactionError::SendTruncated { expected, actual: expected - remaining as u32 });
        }
        writer
            .write_all(&chunk[..n])
            .await
            .map_err(|_| TransactionError::SendTruncated { expected, actual: expected - remaining as u32 })?;
        remaining -= n as u64;
    }
    writer.flush().await.ok();
    Ok(())
}

/// Used by callers that want download warnings folded into the engine's
/// side-channel, e.g. an unexpected-source connection attempt.
pub fn warn_unknown_source(warnings: &mpsc::UnboundedSender<Warning>, address: Ipv4Addr) {
    let _ = warnings.send(Warning { kind: WarningKind::UnknownAddress, address });
}
