//! Catalog store (component C3): table, partition, and tablet metadata,
//! the schema validation (`CheckTableMeta`) and replica placement
//! (`SetPartitionInfo`) logic that feeds table creation.

pub mod error;
pub mod placement;
pub mod store;
pub mod validate;

pub use error::{CatalogError, Result};
pub use placement::assign_partitions;
pub use store::CatalogStore;
pub use validate::{resolve_column_keys, validate_table_meta, SchemaViolation};
