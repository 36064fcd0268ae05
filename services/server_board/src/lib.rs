//! server: the board-side daemon that answers the control protocol over
//! UDP, drives a [`camera::Camera`], and serves captured media over TCP.

pub mod config;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod files;
pub mod handlers;
pub mod outstanding;
pub mod session;
pub mod status_payload;
pub mod time;

pub use config::{ConfigError, ServerConfig, load_config, load_config_from_path};
pub use dispatch::Dispatcher;
pub use error::{HandlerError, ServerError};
