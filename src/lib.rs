#![forbid(unsafe_code)]

//! Relay text commands from a FIFO channel into a terminal-multiplexer
//! pane, recording every exchange in an append-only history log.

pub mod backend;
pub mod bridge;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod history;
pub mod models;
pub mod oplog;

pub use config::BridgeConfig;
pub use errors::{AppError, Result};
