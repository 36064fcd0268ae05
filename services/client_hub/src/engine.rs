//! The client-side transaction engine (spec.md §4.6): registry management,
//! broadcast/unicast fan-out through Repeaters, response collection, and
//! the typed command wrappers built on top of `transact`.

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use protocol::{Command, FileEntry, Fraction, RecordFormat, ResponseBody, Seqno, StatusSnapshot, decode_file_list, decode_response, encode_request};
use repeater::{Repeater, RepeaterConfig};
use tokio::io::AsyncWrite;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::download::DownloadReceiver;
use crate::error::{PeerError, TransactionError, Warning, WarningKind};
use crate::registry::Registry;
use crate::time::now_unix;

pub struct TransactionEngine {
    socket: Arc<UdpSocket>,
    config: EngineConfig,
    registry: Registry,
    seqno_counter: u32,
    warnings: mpsc::UnboundedSender<Warning>,
    expected_version: String,
    download: DownloadReceiver,
}

struct RoundOutcome {
    responses: HashMap<Ipv4Addr, ResponseBody>,
}

impl TransactionEngine {
    /// Bind the engine's single UDP socket (broadcast-enabled) and its TCP
    /// download listener, and return a receiver for the warnings
    /// side-channel (spec.md §9).
    ///
    /// The UDP socket binds an OS-assigned ephemeral port rather than
    /// `config.udp_port` — that field names the fixed port servers listen
    /// on, not a port the client itself needs to occupy; replies route back
    /// to whatever source port the request was sent from regardless. The
    /// TCP listener binds `config.tcp_bind_addr:config.tcp_port`, the port a
    /// `SEND` is told to connect back to.
    pub async fn bind(
        config: EngineConfig,
        expected_version: impl Into<String>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Warning>), TransactionError> {
        let bind_addr = "0.0.0.0:0";
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|source| TransactionError::UdpBind { addr: bind_addr.to_owned(), source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| TransactionError::UdpBind { addr: bind_addr.to_owned(), source })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let tcp_bind_addr = format!("{}:{}", config.tcp_bind_addr, config.tcp_port);
        let download = DownloadReceiver::bind(&tcp_bind_addr, tx.clone()).await?;

        Ok((
            TransactionEngine {
                socket: Arc::new(socket),
                config,
                registry: Registry::new(),
                seqno_counter: 1,
                warnings: tx,
                expected_version: expected_version.into(),
                download,
            },
            rx,
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The engine's own ephemeral UDP address, e.g. for a peer diagnosing
    /// why a reply never arrived.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// A clone of the warnings sender, so a [`crate::download::DownloadReceiver`]
    /// started alongside this engine can share the same side-channel.
    pub fn warnings_sender(&self) -> mpsc::UnboundedSender<Warning> {
        self.warnings.clone()
    }

    fn next_seqno(&mut self) -> Seqno {
        let seqno = Seqno(self.seqno_counter);
        self.seqno_counter = self.seqno_counter.saturating_add(1);
        seqno
    }

    fn warn(&self, kind: WarningKind, address: Ipv4Addr) {
        let _ = self.warnings.send(Warning { kind, address });
    }

    // -- Registry operations (spec.md §4.6) ---------------------------------

    /// Handshake `addr` via `HELLO`, verify its version string, and only
    /// then commit it to the registry.
    pub async fn insert(&mut self, addr: Ipv4Addr) -> Result<(), TransactionError> {
        if self.registry.contains(addr) {
            return Err(TransactionError::RedefinedServer(addr));
        }
        self.hello(addr).await?;
        self.registry.commit(addr);
        Ok(())
    }

    pub async fn append(&mut self, addrs: &[Ipv4Addr]) -> Result<(), TransactionError> {
        for &addr in addrs {
            self.insert(addr).await?;
        }
        Ok(())
    }

    pub async fn extend(&mut self, addrs: &[Ipv4Addr]) -> Result<(), TransactionError> {
        self.append(addrs).await
    }

    /// No protocol traffic, per spec.md §4.6.
    pub fn remove(&mut self, addr: Ipv4Addr) -> bool {
        self.registry.remove(addr)
    }

    pub fn move_server(&mut self, addr: Ipv4Addr, new_index: usize) -> bool {
        self.registry.move_to(addr, new_index)
    }

    pub fn sort(&mut self) {
        self.registry.sort();
    }

    /// Broadcast `HELLO` to the subnet and collect responders until
    /// `expected_count` is reached or `timeout` elapses.
    pub async fn find(&mut self, expected_count: Option<usize>, timeout: Duration) -> Vec<Ipv4Addr> {
        let seqno = self.next_seqno();
        let payload = encode_request(seqno, &Command::Hello { timestamp: now_unix() });
        let dest = SocketAddr::new(self.config.broadcast_address().into(), self.config.udp_port);
        let repeater_config = RepeaterConfig { interval_max: self.config.retry_interval, deadline: timeout };
        let repeater = Repeater::spawn(self.socket.clone(), dest, payload, repeater_config);

        let deadline = Instant::now() + timeout;
        let mut discovered = Vec::new();
        let mut buf = vec![0u8; 2048];

        loop {
            if expected_count.is_some_and(|target| discovered.len() >= target) {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Ok(Ok((n, src))) = tokio::time::timeout(remaining, self.socket.recv_from(&mut buf)).await else {
                break;
            };
            let SocketAddr::V4(src_v4) = src else { continue };
            if src_v4.port() != self.config.udp_port {
                self.warn(WarningKind::WrongPort, *src_v4.ip());
                continue;
            }
            let addr = *src_v4.ip();
            let Ok((resp_seqno, ResponseBody::Ok(Some(data)))) = decode_response(&String::from_utf8_lossy(&buf[..n])) else {
                continue;
            };
            if resp_seqno != seqno || !data.starts_with("VERSION ") {
                continue;
            }
            if self.registry.contains(addr) || discovered.contains(&addr) {
                self.warn(WarningKind::MultiResponse, addr);
                continue;
            }
            if data.trim_start_matches("VERSION ").trim() != self.expected_version {
                self.warn(WarningKind::WrongVersion, addr);
                continue;
            }
            self.registry.commit(addr);
            discovered.push(addr);
        }
        repeater.cancel();
        discovered
    }

    async fn hello(&mut self, addr: Ipv4Addr) -> Result<(), TransactionError> {
        let seqno = self.next_seqno();
        let payload = encode_request(seqno, &Command::Hello { timestamp: now_unix() });
        let dest = SocketAddr::new(addr.into(), self.config.udp_port);
        let repeater_config = RepeaterConfig { interval_max: self.config.retry_interval, deadline: self.config.request_timeout };
        let repeater = Repeater::spawn(self.socket.clone(), dest, payload, repeater_config);

        let deadline = Instant::now() + self.config.request_timeout;
        let mut buf = vec![0u8; 2048];
        let outcome: Result<(), PeerError> = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break Err(PeerError::MissingResponse { address: addr });
            }
            let Ok(Ok((n, src))) = tokio::time::timeout(remaining, self.socket.recv_from(&mut buf)).await else {
                break Err(PeerError::MissingResponse { address: addr });
            };
            let SocketAddr::V4(src_v4) = src else { continue };
            if *src_v4.ip() != addr {
                self.warn(WarningKind::UnknownAddress, *src_v4.ip());
                continue;
            }
            let Ok((resp_seqno, body)) = decode_response(&String::from_utf8_lossy(&buf[..n])) else {
                self.warn(WarningKind::BadResponse, addr);
                continue;
            };
            if resp_seqno != seqno {
                continue;
            }
            match body {
                ResponseBody::Ok(Some(data)) if data.starts_with("VERSION ") => {
                    if data.trim_start_matches("VERSION ").trim() != self.expected_version {
                        self.warn(WarningKind::WrongVersion, addr);
                        break Err(PeerError::InvalidResponse { address: addr });
                    }
                    break Ok(());
                }
                ResponseBody::Error(message) => {
                    self.warn(WarningKind::HelloError, addr);
                    break Err(PeerError::ServerError { address: addr, message });
                }
                _ => break Err(PeerError::InvalidResponse { address: addr }),
            }
        };
        repeater.cancel();
        outcome.map_err(|error| TransactionError::TransactionFailed { failures: vec![error], total: 1 })
    }

    // -- Transact (spec.md §4.6) ---------------------------------------------

    async fn run_round(&mut self, command: &Command, targets: &[Ipv4Addr], broadcast: bool) -> RoundOutcome {
        let seqno = self.next_seqno();
        let payload = encode_request(seqno, command);
        let repeater_config = RepeaterConfig { interval_max: self.config.retry_interval, deadline: self.config.request_timeout };

        let mut repeaters = Vec::new();
        if broadcast {
            let dest = SocketAddr::new(self.config.broadcast_address().into(), self.config.udp_port);
            repeaters.push(Repeater::spawn(self.socket.clone(), dest, payload, repeater_config));
        } else {
            for &addr in targets {
                let dest = SocketAddr::new(addr.into(), self.config.udp_port);
                repeaters.push(Repeater::spawn(self.socket.clone(), dest, payload.clone(), repeater_config));
            }
        }

        let mut pending: HashSet<Ipv4Addr> = targets.iter().copied().collect();
        let mut responses = HashMap::new();
        let deadline = Instant::now() + self.config.request_timeout;
        let mut buf = vec![0u8; 4096];

        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Ok(Ok((n, src))) = tokio::time::timeout(remaining, self.socket.recv_from(&mut buf)).await else {
                break;
            };
            let SocketAddr::V4(src_v4) = src else { continue };
            if src_v4.port() != self.config.udp_port {
                self.warn(WarningKind::WrongPort, *src_v4.ip());
                continue;
            }
            let addr = *src_v4.ip();
            let Ok((resp_seqno, body)) = decode_response(&String::from_utf8_lossy(&buf[..n])) else {
                self.warn(WarningKind::BadResponse, addr);
                continue;
            };
            if resp_seqno < seqno {
                self.warn(WarningKind::StaleResponse, addr);
                continue;
            }
            if resp_seqno > seqno {
                self.warn(WarningKind::FutureResponse, addr);
                continue;
            }
            if !targets.contains(&addr) {
                self.warn(WarningKind::UnknownAddress, addr);
                continue;
            }
            if responses.contains_key(&addr) {
                self.warn(WarningKind::MultiResponse, addr);
                continue;
            }
            responses.insert(addr, body);
            pending.remove(&addr);
        }

        for repeater in repeaters {
            repeater.cancel();
        }

        // ACK every address that answered, fire-and-forget with a short lifetime.
        for &addr in responses.keys() {
            let dest = SocketAddr::new(addr.into(), self.config.udp_port);
            let ack_payload = encode_request(seqno, &Command::Ack);
            let ack_config = RepeaterConfig { interval_max: self.config.retry_interval, deadline: Duration::from_millis(500) };
            let repeater = Repeater::spawn(self.socket.clone(), dest, ack_payload, ack_config);
            tokio::spawn(repeater.join());
        }

        RoundOutcome { responses }
    }

    /// The core primitive behind every typed wrapper (spec.md §4.6).
    pub async fn transact(
        &mut self,
        command: Command,
        targets: Option<&[Ipv4Addr]>,
    ) -> Result<HashMap<Ipv4Addr, Option<String>>, TransactionError> {
        let target_list: Vec<Ipv4Addr> = match targets {
            Some(addrs) => {
                let undefined: Vec<Ipv4Addr> =
                    addrs.iter().copied().filter(|a| !self.registry.contains(*a)).collect();
                if !undefined.is_empty() {
                    return Err(TransactionError::UndefinedServers(undefined));
                }
                addrs.to_vec()
            }
            None => {
                if self.registry.is_empty() {
                    return Err(TransactionError::NoServers);
                }
                self.registry.iter().collect()
            }
        };

        let broadcast = targets.is_none();
        let outcome = self.run_round(&command, &target_list, broadcast).await;

        let mut results = HashMap::new();
        let mut failures = Vec::new();
        for addr in &target_list {
            match outcome.responses.get(addr) {
                Some(ResponseBody::Ok(data)) => {
                    results.insert(*addr, data.clone());
                }
                Some(ResponseBody::Error(message)) => {
                    failures.push(PeerError::ServerError { address: *addr, message: message.clone() });
                }
                None => failures.push(PeerError::MissingResponse { address: *addr }),
            }
        }

        if failures.is_empty() {
            Ok(results)
        } else {
            Err(TransactionError::TransactionFailed { failures, total: target_list.len() })
        }
    }

    // -- Typed wrappers (spec.md §4.6) ---------------------------------------

    pub async fn status(&mut self, targets: Option<&[Ipv4Addr]>) -> Result<HashMap<Ipv4Addr, StatusSnapshot>, TransactionError> {
        let raw = self.transact(Command::Status, targets).await?;
        let total = raw.len();
        let mut out = HashMap::new();
        let mut failures = Vec::new();
        for (addr, data) in raw {
            match data.as_deref().map(StatusSnapshot::from_lines) {
                Some(Ok(snapshot)) => {
                    out.insert(addr, snapshot);
                }
                _ => failures.push(PeerError::InvalidResponse { address: addr }),
            }
        }
        if failures.is_empty() { Ok(out) } else { Err(TransactionError::TransactionFailed { failures, total }) }
    }

    pub async fn resolution(&mut self, targets: Option<&[Ipv4Addr]>, width: i64, height: i64) -> Result<(), TransactionError> {
        self.transact(Command::Resolution { width, height }, targets).await.map(|_| ())
    }

    pub async fn framerate(&mut self, targets: Option<&[Ipv4Addr]>, rate: Fraction) -> Result<(), TransactionError> {
        self.transact(Command::Framerate { rate }, targets).await.map(|_| ())
    }

    pub async fn awb(
        &mut self,
        targets: Option<&[Ipv4Addr]>,
        mode: impl Into<String>,
        red: Fraction,
        blue: Fraction,
    ) -> Result<(), TransactionError> {
        self.transact(Command::Awb { mode: mode.into(), red, blue }, targets).await.map(|_| ())
    }

    pub async fn agc(&mut self, targets: Option<&[Ipv4Addr]>, mode: impl Into<String>) -> Result<(), TransactionError> {
        self.transact(Command::Agc { mode: mode.into() }, targets).await.map(|_| ())
    }

    pub async fn exposure(
        &mut self,
        targets: Option<&[Ipv4Addr]>,
        mode: impl Into<String>,
        speed_ms: f64,
    ) -> Result<(), TransactionError> {
        self.transact(Command::Exposure { mode: mode.into(), speed_ms }, targets).await.map(|_| ())
    }

    pub async fn metering(&mut self, targets: Option<&[Ipv4Addr]>, mode: impl Into<String>) -> Result<(), TransactionError> {
        self.transact(Command::Metering { mode: mode.into() }, targets).await.map(|_| ())
    }

    pub async fn iso(&mut self, targets: Option<&[Ipv4Addr]>, iso: i64) -> Result<(), TransactionError> {
        self.transact(Command::Iso { iso }, targets).await.map(|_| ())
    }

    pub async fn brightness(&mut self, targets: Option<&[Ipv4Addr]>, value: i64) -> Result<(), TransactionError> {
        self.transact(Command::Brightness { value }, targets).await.map(|_| ())
    }

    pub async fn contrast(&mut self, targets: Option<&[Ipv4Addr]>, value: i64) -> Result<(), TransactionError> {
        self.transact(Command::Contrast { value }, targets).await.map(|_| ())
    }

    pub async fn saturation(&mut self, targets: Option<&[Ipv4Addr]>, value: i64) -> Result<(), TransactionError> {
        self.transact(Command::Saturation { value }, targets).await.map(|_| ())
    }

    pub async fn ev(&mut self, targets: Option<&[Ipv4Addr]>, value: i64) -> Result<(), TransactionError> {
        self.transact(Command::Ev { value }, targets).await.map(|_| ())
    }

    pub async fn flip(&mut self, targets: Option<&[Ipv4Addr]>, horizontal: bool, vertical: bool) -> Result<(), TransactionError> {
        self.transact(Command::Flip { horizontal, vertical }, targets).await.map(|_| ())
    }

    pub async fn denoise(&mut self, targets: Option<&[Ipv4Addr]>, enabled: bool) -> Result<(), TransactionError> {
        self.transact(Command::Denoise { enabled }, targets).await.map(|_| ())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn capture(
        &mut self,
        targets: Option<&[Ipv4Addr]>,
        count: i64,
        video_port: bool,
        quality: Option<i64>,
        sync: Option<f64>,
    ) -> Result<(), TransactionError> {
        self.transact(Command::Capture { count, video_port, quality, sync }, targets).await.map(|_| ())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &mut self,
        targets: Option<&[Ipv4Addr]>,
        length: f64,
        format: RecordFormat,
        quality: i64,
        bitrate: i64,
        intra_period: Option<i64>,
        motion: bool,
        sync: Option<f64>,
    ) -> Result<(), TransactionError> {
        self.transact(Command::Record { length, format, quality, bitrate, intra_period, motion, sync }, targets)
            .await
            .map(|_| ())
    }

    pub async fn list_(&mut self, targets: Option<&[Ipv4Addr]>) -> Result<HashMap<Ipv4Addr, Vec<FileEntry>>, TransactionError> {
        let raw = self.transact(Command::List, targets).await?;
        let total = raw.len();
        let mut out = HashMap::new();
        let mut failures = Vec::new();
        for (addr, data) in raw {
            match decode_file_list(&data.unwrap_or_default()) {
                Ok(entries) => {
                    out.insert(addr, entries);
                }
                Err(_) => failures.push(PeerError::InvalidResponse { address: addr }),
            }
        }
        if failures.is_empty() { Ok(out) } else { Err(TransactionError::TransactionFailed { failures, total }) }
    }

    pub async fn clear(&mut self, targets: Option<&[Ipv4Addr]>) -> Result<(), TransactionError> {
        self.transact(Command::Clear, targets).await.map(|_| ())
    }

    pub async fn identify(&mut self, targets: Option<&[Ipv4Addr]>) -> Result<(), TransactionError> {
        self.transact(Command::Blink, targets).await.map(|_| ())
    }

    pub async fn send(&mut self, target: Ipv4Addr, index: u32, port: u16) -> Result<(), TransactionError> {
        self.transact(Command::Send { index, port }, Some(&[target])).await.map(|_| ())
    }

    /// Download file `index` from `target` in one step (spec.md §4.7): arm
    /// the TCP listener, issue `SEND` naming this engine's own download
    /// port, and run both concurrently — the UDP acknowledgment for `SEND`
    /// and the TCP transfer it triggers are independent and must not wait
    /// on each other.
    pub async fn download(
        &mut self,
        target: Ipv4Addr,
        index: u32,
        writer: impl AsyncWrite + Unpin + Send + 'static,
        transfer_timeout: Duration,
    ) -> Result<(), TransactionError> {
        // Clone out a handle first: `self.send` needs `&mut self` for the
        // duration of its future, which would otherwise conflict with
        // borrowing `self.download` for the same `join!`.
        let download = self.download.clone();
        let port = download.local_port();
        let (send_result, recv_result) =
            tokio::join!(self.send(target, index, port), download.receive(target, writer, transfer_timeout));
        send_result?;
        recv_result
    }
}
