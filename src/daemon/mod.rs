//! Background fetch daemon.
//!
//! A long-lived process that keeps one [`FetchSession`] warm and serves it as
//! HTTP/1.1 on a Unix socket in the config directory. Clients:
//!
//! - [`DaemonClient`] - health, fetch and shutdown calls
//! - [`ProcessLauncher`] - starts `broadsheet serve` detached when nothing answers
//!
//! The session serializes fetches, so throughput is one article at a time
//! no matter how many UI processes are asking.

mod client;
mod process;
pub mod protocol;
mod server;
mod session;

use crate::error::FetchError;
use std::path::PathBuf;
use thiserror::Error;

pub use client::{DaemonClient, CONTROL_TIMEOUT};
pub use process::{DaemonLauncher, ProcessLauncher};
pub use protocol::ProtocolError;
pub use server::DaemonServer;
pub use session::FetchSession;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("fetch daemon not running")]
    NotRunning,

    #[error("a fetch daemon is already listening on {0}")]
    AlreadyRunning(PathBuf),

    #[error("fetch daemon did not answer in time")]
    Timeout,

    #[error("fetch daemon replied with status {0}")]
    Status(u16),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("daemon I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DaemonError> for FetchError {
    /// Refused, missing and silent daemons all read as "not running".
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::NotRunning | DaemonError::Timeout => FetchError::NotRunning,
            other => FetchError::transport(other),
        }
    }
}
