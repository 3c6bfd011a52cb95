//! Logging utilities.
//!
//! Centralizes logger initialization. Library code logs through the `log`
//! facade only; binaries pick the backend here.

mod init;

pub use init::{LoggingConfig, init_logging};
