//! Scheduler errors.

use tabletctl_catalog::CatalogError;
use tabletctl_coord::CoordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown op: {0}")]
    UnknownOp(u64),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("coordination service error: {0}")]
    Coord(#[from] CoordError),

    #[error("tablet RPC to {endpoint} failed: {message}")]
    TabletRpc { endpoint: String, message: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
