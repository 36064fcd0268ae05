use std::net::SocketAddr;

use protocol::Seqno;

/// Binds the server to exactly one client for the session's lifetime
/// (spec.md §4.4's "single-client affinity"), and tracks the seqno and
/// client-time bookkeeping that govern idempotence.
#[derive(Debug, Default)]
pub struct ClientSession {
    bound_addr: Option<SocketAddr>,
    last_client_time: Option<f64>,
    current_seqno: u32,
}

impl ClientSession {
    pub fn new() -> Self {
        ClientSession::default()
    }

    pub fn current_seqno(&self) -> Seqno {
        Seqno(self.current_seqno)
    }

    /// No client bound yet always passes — only `HELLO` is meaningful before
    /// a session exists, and this lets that first `HELLO` reach the handler.
    pub fn is_bound_to(&self, addr: SocketAddr) -> bool {
        self.bound_addr.is_none_or(|bound| bound == addr)
    }

    /// `HELLO`: accept iff `client_time` strictly exceeds the last seen
    /// value. On acceptance the session rebinds to `addr` and `seqno`.
    pub fn accept_hello(&mut self, addr: SocketAddr, client_time: f64, seqno: Seqno) -> bool {
        if let Some(last) = self.last_client_time {
            if client_time <= last {
                return false;
            }
        }
        self.bound_addr = Some(addr);
        self.last_client_time = Some(client_time);
        self.current_seqno = seqno.0;
        true
    }

    pub fn advance(&mut self, seqno: Seqno) {
        self.current_seqno = seqno.0;
    }
}
