use std::net::Ipv4Addr;

/// Per-address failure, aggregated into a [`TransactionError::TransactionFailed`]
/// (spec.md §7, §9's "Aggregated error" design note).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PeerError {
    #[error("{address}: response was not parseable")]
    InvalidResponse { address: Ipv4Addr },
    #[error("{address}: no response within the deadline")]
    MissingResponse { address: Ipv4Addr },
    #[error("{address}: server reported an error: {message}")]
    ServerError { address: Ipv4Addr, message: String },
}

impl PeerError {
    pub fn address(&self) -> Ipv4Addr {
        match self {
            PeerError::InvalidResponse { address }
            | PeerError::MissingResponse { address }
            | PeerError::ServerError { address, .. } => *address,
        }
    }
}

/// Fatal, client-side operation failures (spec.md §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransactionError {
    #[error("no servers in registry")]
    NoServers,
    #[error("target addresses are not in the registry: {0:?}")]
    UndefinedServers(Vec<Ipv4Addr>),
    #[error("{0} is already in the registry")]
    RedefinedServer(Ipv4Addr),
    #[error("transaction failed for {} of {} address(es)", .failures.len(), .total)]
    TransactionFailed { failures: Vec<PeerError>, total: usize },
    #[error("timed out waiting for SEND")]
    SendTimeout,
    #[error("download truncated: expected {expected} bytes, got {actual}")]
    SendTruncated { expected: u32, actual: u32 },
    #[error("binding UDP socket on {addr}: {source}")]
    UdpBind { addr: String, source: std::io::Error },
    #[error("sending datagram to {addr}: {source}")]
    UdpSend { addr: String, source: std::io::Error },
}

/// Non-fatal, per-packet conditions surfaced through the warnings
/// side-channel rather than the primary return path (spec.md §7, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    WrongPort,
    UnknownAddress,
    MultiResponse,
    BadResponse,
    StaleResponse,
    FutureResponse,
    StaleSequence,
    StaleClientTime,
    InvalidClient,
    WrongVersion,
    HelloError,
}

#[derive(Debug, Clone, Copy)]
pub struct Warning {
    pub kind: WarningKind,
    pub address: Ipv4Addr,
}
