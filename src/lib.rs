//! Workspace root crate.
//!
//! Carries no code of its own — `protocol`, `repeater`, `camera`, `server`,
//! and `client` are the real implementation crates. This crate exists only
//! to host the end-to-end tests under `tests/` that drive a real
//! [`server::Dispatcher`] against a real [`client::TransactionEngine`] over
//! loopback sockets, the way `rusty-timer`'s root crate hosts its
//! `tests/integration/*` suite.
