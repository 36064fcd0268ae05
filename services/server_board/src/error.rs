use std::net::SocketAddr;

/// Failure to start the server runtime itself (bind, config).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("binding UDP socket on {addr}: {source}")]
    UdpBind { addr: String, source: std::io::Error },
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// A command handler failure. `Display` renders exactly the text sent back
/// as the wire `ERROR <message>` payload (spec.md §4.3/§7).
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Invalid client or protocol error")]
    WrongClient,
    #[error("unsupported {field} mode '{mode}'")]
    UnsupportedMode { field: &'static str, mode: String },
    #[error("camera is busy with another capture or recording")]
    CameraBusy,
    #[error("sync time {sync} is in the past")]
    SyncInPast { sync: f64 },
    #[error("no file at index {index}")]
    NoSuchFile { index: u32 },
    #[error("connecting to client for SEND: {0}")]
    SendConnect(String),
    #[error("stale client-time in HELLO")]
    StaleClientTime,
}

impl From<camera::CameraError> for HandlerError {
    fn from(error: camera::CameraError) -> Self {
        match error {
            camera::CameraError::UnsupportedMode { field, mode } => {
                HandlerError::UnsupportedMode { field, mode }
            }
            camera::CameraError::Busy => HandlerError::CameraBusy,
        }
    }
}

/// Tags a source address rejected before reaching the dispatcher proper —
/// used only for `tracing` context, never sent on the wire.
#[derive(Debug, Clone, Copy)]
pub struct RejectedFrom(pub SocketAddr);
