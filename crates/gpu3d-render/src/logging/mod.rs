//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only uses the
//! `log` facade; binaries and tests call `init_logging` once.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
