//! Cluster registry (component C4): peer replica cluster bookkeeping,
//! term-fenced handshakes, and the periodic table-comparison job.

pub mod compare;
pub mod error;
pub mod ns_client;
pub mod registry;

pub use compare::{compare_table_info, TableCompareResult};
pub use error::{RegistryError, Result};
pub use ns_client::{NsClient, TaskStatusSummary};
pub use registry::{ClusterRegistry, ClusterSyncOutcome};
