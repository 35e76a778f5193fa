//! OP Scheduler (spec.md C5/C6): materializes administrative operations
//! into deterministic task lists, routes them to shard workers keyed by
//! partition id, and dispatches task execution onto a bounded thread
//! pool.

pub mod dispatch;
pub mod error;
pub mod fake_tablet_client;
pub mod leader_selection;
pub mod op_builder;
pub mod runtime;
pub mod shard;
pub mod tablet_client;

pub use error::{Result, SchedulerError};
pub use fake_tablet_client::FakeTabletClient;
pub use leader_selection::{choose_recovery_strategy, select_leader, Candidate, RecoveryStrategy};
pub use op_builder::{build_tasks, OpRequest};
pub use runtime::OpScheduler;
pub use shard::{ShardPool, ShardRouter};
pub use tablet_client::{TableStatus, TabletClient};
