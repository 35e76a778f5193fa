//! Cluster registry errors.

use tabletctl_coord::CoordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("replica cluster already registered: {0}")]
    AliasExists(String),

    #[error("replica cluster not registered: {0}")]
    AliasMissing(String),

    #[error("stale fencing term for {alias}: handshake term {handshake}, registry term {registry}")]
    StaleTerm {
        alias: String,
        handshake: u64,
        registry: u64,
    },

    #[error("peer name server RPC failed: {0}")]
    PeerRpc(String),

    #[error("coordination service error: {0}")]
    Coord(#[from] CoordError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
