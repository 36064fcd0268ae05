//! client: the Compound Pi fleet transaction engine.
//!
//! This crate is a library consumed by an out-of-scope shell or GUI; it
//! owns the UDP control socket and TCP download listener and exposes the
//! typed operations a caller drives a fleet of servers with. See
//! [`engine::TransactionEngine`] for the entry point.

pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod registry;
pub mod time;

pub use config::{ConfigError, EngineConfig, load_config_from_str};
pub use download::DownloadReceiver;
pub use engine::TransactionEngine;
pub use error::{PeerError, TransactionError, Warning, WarningKind};
pub use registry::Registry;
