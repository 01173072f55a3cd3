//! Logging utilities.
//!
//! Centralizes logger initialization. The crate itself only emits through the
//! `log` facade; `env_logger` is wired up here for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
