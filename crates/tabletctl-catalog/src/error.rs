//! Catalog store errors.

use tabletctl_coord::CoordError;
use thiserror::Error;

use crate::validate::SchemaViolation;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("schema validation failed: {0:?}")]
    SchemaInvalid(Vec<SchemaViolation>),

    #[error("replica factor {requested} exceeds live tablet count {live}")]
    ReplicaFactorExceedsLiveTablets { requested: u32, live: usize },

    #[error("update conflict on {table}: expected version {expected}, found {actual}")]
    Conflict {
        table: String,
        expected: u64,
        actual: u64,
    },

    #[error("coordination service error: {0}")]
    Coord(#[from] CoordError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
