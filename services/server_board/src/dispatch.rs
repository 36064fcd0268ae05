//! The single dispatcher task: owns the UDP socket, the client session, the
//! file store, and the outstanding-response table (spec.md §4.4, §5).

use std::net::SocketAddr;
use std::sync::Arc;

use camera::Camera;
use protocol::{Command, ResponseBody, Seqno, decode_request, encode_response};
use repeater::{Repeater, RepeaterConfig};
use tokio::net::UdpSocket;

use crate::download;
use crate::error::HandlerError;
use crate::files::FileStore;
use crate::handlers;
use crate::outstanding::{OutstandingEntry, OutstandingTable};
use crate::session::ClientSession;

pub const PROTOCOL_VERSION: &str = "1.0";

pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    camera: Arc<dyn Camera>,
    files: FileStore,
    session: ClientSession,
    outstanding: OutstandingTable,
    repeater_config: RepeaterConfig,
}

impl Dispatcher {
    pub fn new(socket: Arc<UdpSocket>, camera: Arc<dyn Camera>, repeater_config: RepeaterConfig) -> Self {
        Dispatcher {
            socket,
            camera,
            files: FileStore::new(),
            session: ClientSession::new(),
            outstanding: OutstandingTable::new(),
            repeater_config,
        }
    }

    /// Run forever, reading datagrams off the socket one at a time.
    pub async fn run(&mut self) {
        let mut buf = vec![0u8; 2048];
        loop {
            let (n, src) = match self.socket.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(error) => {
                    tracing::warn!(%error, "udp recv_from failed");
                    continue;
                }
            };
            let datagram = String::from_utf8_lossy(&buf[..n]).into_owned();
            self.handle_datagram(&datagram, src).await;
        }
    }

    async fn handle_datagram(&mut self, line: &str, src: SocketAddr) {
        let (seqno, command) = match decode_request(line) {
            Ok(v) => v,
            Err(error) => {
                tracing::warn!(%src, %error, "malformed datagram");
                let bytes = encode_response(Seqno::ERROR, &ResponseBody::Error(error.to_string()));
                if let Err(error) = self.socket.send_to(&bytes, src).await {
                    tracing::warn!(%src, %error, "failed to send framing-error response");
                }
                return;
            }
        };

        tracing::debug!(%src, seqno = seqno.0, command = command.name(), "dispatching");

        match command {
            Command::Hello { timestamp } => self.handle_hello(seqno, timestamp, src).await,
            Command::Ack => self.handle_ack(seqno, src),
            other => self.handle_bound_command(seqno, other, src).await,
        }
    }

    async fn handle_hello(&mut self, seqno: Seqno, timestamp: f64, src: SocketAddr) {
        if !self.session.accept_hello(src, timestamp, seqno) {
            tracing::warn!(%src, timestamp, "stale client-time in HELLO rejected");
            self.respond(seqno, src, ResponseBody::Error(HandlerError::StaleClientTime.to_string())).await;
            return;
        }
        self.outstanding.clear();
        tracing::info!(%src, seqno = seqno.0, "client bound via HELLO");
        self.respond(seqno, src, ResponseBody::Ok(Some(format!("VERSION {PROTOCOL_VERSION}")))).await;
    }

    fn handle_ack(&mut self, seqno: Seqno, src: SocketAddr) {
        if !self.session.is_bound_to(src) {
            return;
        }
        self.outstanding.remove(seqno);
    }

    async fn handle_bound_command(&mut self, seqno: Seqno, command: Command, src: SocketAddr) {
        if !self.session.is_bound_to(src) {
            tracing::warn!(%src, "command from unbound address rejected");
            self.respond(seqno, src, ResponseBody::Error(HandlerError::WrongClient.to_string())).await;
            return;
        }

        let current = self.session.current_seqno();
        if seqno < current {
            tracing::debug!(%src, seqno = seqno.0, current = current.0, "stale seqno dropped");
            return;
        }
        if seqno == current {
            if let Some(response) = self.outstanding.get_response(seqno) {
                self.refire(seqno, src, response);
            }
            return;
        }

        self.session.advance(seqno);
        self.outstanding.retain_from(seqno);

        let result = if let Command::Send { index, port } = command {
            match self.files.get(index) {
                Some(file) => {
                    let payload = file.payload.clone();
                    let client_ip = src.ip();
                    tokio::spawn(async move {
                        if let Err(error) = download::send_file(payload, client_ip, port).await {
                            tracing::warn!(%client_ip, port, %error, "SEND transfer failed");
                        }
                    });
                    Ok(None)
                }
                None => Err(HandlerError::NoSuchFile { index }),
            }
        } else {
            handlers::handle_command(&self.camera, &mut self.files, &command).await
        };

        let body = match result {
            Ok(data) => ResponseBody::Ok(data),
            Err(error) => {
                tracing::warn!(%src, %error, command = command.name(), "handler error");
                ResponseBody::Error(error.to_string())
            }
        };
        self.respond(seqno, src, body).await;
    }

    async fn respond(&mut self, seqno: Seqno, src: SocketAddr, body: ResponseBody) {
        let bytes = encode_response(seqno, &body);
        self.refire(seqno, src, bytes);
    }

    /// Cancel any existing repeater for `seqno` and spawn a fresh one
    /// retransmitting `response` — both a first send and a re-fire of a
    /// cached duplicate go through this one path.
    fn refire(&mut self, seqno: Seqno, src: SocketAddr, response: Vec<u8>) {
        self.outstanding.remove(seqno);
        let repeater = Repeater::spawn(self.socket.clone(), src, response.clone(), self.repeater_config);
        self.outstanding.insert(seqno, OutstandingEntry { repeater, response });
    }
}
