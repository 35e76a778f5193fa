//! `NsClient`: the peer-name-server RPC surface (spec §6). The wire
//! transport is out of scope for this repository; the registry and
//! scheduler call through this trait object only.

use tabletctl_types::{OpId, TableInfo};

/// RPCs this name server issues to a peer cluster's name server.
pub trait NsClient: Send + Sync {
    fn list_tables(&self) -> std::result::Result<Vec<TableInfo>, String>;

    fn create_table_remote(&self, table: &TableInfo) -> std::result::Result<(), String>;

    fn drop_table_remote(&self, table: &str) -> std::result::Result<(), String>;

    fn sync_table(&self, table: &str) -> std::result::Result<(), String>;

    fn get_task_status(&self, op_id: OpId) -> std::result::Result<TaskStatusSummary, String>;

    fn delete_op_task(&self, op_id: OpId) -> std::result::Result<(), String>;
}

/// Remote status of an OP, as reported by `GetTaskStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusSummary {
    pub op_id: OpId,
    pub done: bool,
    pub failed: bool,
}
