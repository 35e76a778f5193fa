//! Errors surfaced by the coordination-service client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordError {
    #[error("session expired")]
    SessionExpired,

    #[error("not connected to the coordination service")]
    NotConnected,

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("node not found: {0}")]
    NodeMissing(String),

    #[error("version conflict writing {path}: expected {expected}, found {actual}")]
    VersionConflict {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("coordination service I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, CoordError>;
