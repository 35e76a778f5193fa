//! Reconciler errors.

use tabletctl_catalog::CatalogError;
use tabletctl_coord::CoordError;
use tabletctl_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("coordination service error: {0}")]
    Coord(#[from] CoordError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

pub type Result<T> = std::result::Result<T, ReconcilerError>;
