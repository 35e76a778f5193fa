//! Shared entity, op, and task types for the name server control plane.
//!
//! This crate has no behavior of its own: it is the vocabulary every
//! other `tabletctl-*` crate builds on (catalog state, scheduler work
//! units, cluster registry entries).

pub mod cluster;
pub mod entity;
pub mod ids;
pub mod op;

pub use cluster::{ClusterHealth, ClusterInfo, ReplicaClusterRole, ZoneInfo};
pub use entity::{
    now_nanos, BlobServer, ColumnDesc, ColumnType, IndexDescriptor, Liveness, Partition, Replica,
    StorageMode, TableInfo, Tablet, TtlConfig,
};
pub use ids::{Endpoint, OpId, Pid, TaskId, Term};
pub use op::{OpInfo, OpState, OpType, Task, TaskArgs, TaskStatus, TaskType};
