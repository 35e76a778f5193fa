//! The OP/Task model (spec.md §3, §4.5, §4.6): a persistent, resumable
//! unit of scheduler work and its ordered list of task primitives.

use serde::{Deserialize, Serialize};

use crate::ids::{Endpoint, OpId, Pid, TaskId, Term};

/// Closed enumeration of administrative operations the scheduler knows
/// how to materialize into a task list. One `CreateXxxOPTask` function
/// per variant builds the task list deterministically from the OP body
/// (see `tabletctl-scheduler`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    CreateTable,
    DropTable,
    AddReplica,
    DelReplica,
    ChangeLeader,
    OfflineReplica,
    RecoverTable,
    Migrate,
    MakeSnapshot,
    ReAddReplicaSimplify,
    ReAddReplicaNoSend,
    ReAddReplicaWithDrop,
    ReLoadTable,
    UpdatePartitionStatus,
    AddIndex,
    SyncTable,
    CreateTableRemote,
    DropTableRemote,
    AddReplicaRemote,
    AddReplicaRemoteSimplify,
    DelReplicaRemote,
}

/// Lifecycle state of an [`OpInfo`] or [`Task`] (spec I4: monotone DAG,
/// never regresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpState {
    Inited,
    Doing,
    Done,
    Failed,
    Canceled,
}

impl OpState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OpState::Done | OpState::Failed | OpState::Canceled)
    }

    /// Valid direct successors per I4. `Canceled` is reachable from any
    /// non-terminal state, so it is checked separately by callers.
    pub fn can_advance_to(self, next: OpState) -> bool {
        use OpState::{Canceled, Doing, Done, Failed, Inited};
        if next == Canceled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Inited, Doing) | (Doing, Done) | (Doing, Failed)
        )
    }
}

/// Closed set of task primitives (spec.md §4.6). Each is re-entrant: a
/// tablet replaying an already-completed primitive returns success
/// without state change, so the scheduler can safely re-dispatch after a
/// crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    MakeSnapshot,
    PauseSnapshot,
    RecoverSnapshot,
    SendSnapshot,
    LoadTable,
    LoadTableRemote,
    AddReplica,
    AddReplicaRemote,
    AddReplicaNsRemote,
    AddTableInfo,
    DelReplica,
    DelTableInfo,
    UpdateTableInfo,
    UpdatePartitionStatus,
    SelectLeader,
    ChangeLeader,
    UpdateLeaderInfo,
    CheckBinlogSyncProgress,
    DropTable,
    RecoverTable,
    CreateTableRemote,
    DropTableRemote,
    DumpIndexData,
    SendIndexData,
    LoadIndexData,
    ExtractIndexData,
    AddIndexToTablet,
    TableSync,
}

/// Status of a single [`Task`]. Distinct from [`OpState`] because a task
/// can be individually retried while its owning OP stays `Doing`.
pub type TaskStatus = OpState;

/// Arguments carried by a task, one variant per [`TaskType`], holding
/// exactly what is needed to re-dispatch idempotently after a crash.
///
/// Kept as tagged variants rather than captured closures/trait objects
/// so `RecoverOPTask` can reconstruct a task purely from its persisted
/// body (design note: "function-dispatch table, not deep callback
/// graph").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskArgs {
    MakeSnapshot {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    PauseSnapshot {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    RecoverSnapshot {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    SendSnapshot {
        from: Endpoint,
        to: Endpoint,
        table: String,
        pid: Pid,
    },
    LoadTable {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    LoadTableRemote {
        cluster_alias: String,
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    AddReplica {
        leader: Endpoint,
        follower: Endpoint,
        table: String,
        pid: Pid,
    },
    AddReplicaRemote {
        cluster_alias: String,
        leader: Endpoint,
        follower: Endpoint,
        table: String,
        pid: Pid,
    },
    AddReplicaNsRemote {
        cluster_alias: String,
        table: String,
        pid: Pid,
        term: Term,
    },
    AddTableInfo {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    DelReplica {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    DelTableInfo {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    UpdateTableInfo {
        table: String,
        expected_version: u64,
    },
    UpdatePartitionStatus {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
        is_leader: bool,
        is_alive: bool,
    },
    SelectLeader {
        table: String,
        pid: Pid,
        candidates: Vec<Endpoint>,
    },
    ChangeLeader {
        table: String,
        pid: Pid,
        new_leader: Endpoint,
    },
    UpdateLeaderInfo {
        table: String,
        pid: Pid,
        new_leader: Endpoint,
    },
    CheckBinlogSyncProgress {
        table: String,
        pid: Pid,
        follower: Endpoint,
        max_lag_offset: u64,
    },
    DropTable {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
    },
    RecoverTable {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    CreateTableRemote {
        cluster_alias: String,
        table: String,
    },
    DropTableRemote {
        cluster_alias: String,
        table: String,
    },
    DumpIndexData {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
        index_name: String,
    },
    SendIndexData {
        from: Endpoint,
        to: Endpoint,
        table: String,
        pid: Pid,
    },
    LoadIndexData {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
        index_name: String,
    },
    ExtractIndexData {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
        index_name: String,
    },
    AddIndexToTablet {
        endpoint: Endpoint,
        table: String,
        pid: Pid,
        index_name: String,
    },
    TableSync {
        cluster_alias: String,
        table: String,
        pid: Pid,
    },
}

impl TaskArgs {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskArgs::MakeSnapshot { .. } => TaskType::MakeSnapshot,
            TaskArgs::PauseSnapshot { .. } => TaskType::PauseSnapshot,
            TaskArgs::RecoverSnapshot { .. } => TaskType::RecoverSnapshot,
            TaskArgs::SendSnapshot { .. } => TaskType::SendSnapshot,
            TaskArgs::LoadTable { .. } => TaskType::LoadTable,
            TaskArgs::LoadTableRemote { .. } => TaskType::LoadTableRemote,
            TaskArgs::AddReplica { .. } => TaskType::AddReplica,
            TaskArgs::AddReplicaRemote { .. } => TaskType::AddReplicaRemote,
            TaskArgs::AddReplicaNsRemote { .. } => TaskType::AddReplicaNsRemote,
            TaskArgs::AddTableInfo { .. } => TaskType::AddTableInfo,
            TaskArgs::DelReplica { .. } => TaskType::DelReplica,
            TaskArgs::DelTableInfo { .. } => TaskType::DelTableInfo,
            TaskArgs::UpdateTableInfo { .. } => TaskType::UpdateTableInfo,
            TaskArgs::UpdatePartitionStatus { .. } => TaskType::UpdatePartitionStatus,
            TaskArgs::SelectLeader { .. } => TaskType::SelectLeader,
            TaskArgs::ChangeLeader { .. } => TaskType::ChangeLeader,
            TaskArgs::UpdateLeaderInfo { .. } => TaskType::UpdateLeaderInfo,
            TaskArgs::CheckBinlogSyncProgress { .. } => TaskType::CheckBinlogSyncProgress,
            TaskArgs::DropTable { .. } => TaskType::DropTable,
            TaskArgs::RecoverTable { .. } => TaskType::RecoverTable,
            TaskArgs::CreateTableRemote { .. } => TaskType::CreateTableRemote,
            TaskArgs::DropTableRemote { .. } => TaskType::DropTableRemote,
            TaskArgs::DumpIndexData { .. } => TaskType::DumpIndexData,
            TaskArgs::SendIndexData { .. } => TaskType::SendIndexData,
            TaskArgs::LoadIndexData { .. } => TaskType::LoadIndexData,
            TaskArgs::ExtractIndexData { .. } => TaskType::ExtractIndexData,
            TaskArgs::AddIndexToTablet { .. } => TaskType::AddIndexToTablet,
            TaskArgs::TableSync { .. } => TaskType::TableSync,
        }
    }

    /// The endpoint a tablet-facing task executes against, if any.
    /// `None` for tasks that only touch the catalog (e.g.
    /// `UpdateTableInfo`).
    pub fn executing_endpoint(&self) -> Option<&Endpoint> {
        match self {
            TaskArgs::MakeSnapshot { endpoint, .. }
            | TaskArgs::PauseSnapshot { endpoint, .. }
            | TaskArgs::RecoverSnapshot { endpoint, .. }
            | TaskArgs::LoadTable { endpoint, .. }
            | TaskArgs::LoadTableRemote { endpoint, .. }
            | TaskArgs::AddTableInfo { endpoint, .. }
            | TaskArgs::DelReplica { endpoint, .. }
            | TaskArgs::DelTableInfo { endpoint, .. }
            | TaskArgs::UpdatePartitionStatus { endpoint, .. }
            | TaskArgs::DropTable { endpoint, .. }
            | TaskArgs::RecoverTable { endpoint, .. }
            | TaskArgs::DumpIndexData { endpoint, .. }
            | TaskArgs::LoadIndexData { endpoint, .. }
            | TaskArgs::ExtractIndexData { endpoint, .. }
            | TaskArgs::AddIndexToTablet { endpoint, .. } => Some(endpoint),
            TaskArgs::SendSnapshot { from, .. } | TaskArgs::SendIndexData { from, .. } => {
                Some(from)
            }
            TaskArgs::AddReplica { leader, .. } => Some(leader),
            TaskArgs::AddReplicaRemote { leader, .. } => Some(leader),
            TaskArgs::ChangeLeader { new_leader, .. } => Some(new_leader),
            TaskArgs::CheckBinlogSyncProgress { follower, .. } => Some(follower),
            _ => None,
        }
    }
}

/// A single step of an OP's task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    pub args: TaskArgs,
    /// Index of this task's parent within the same OP's flat task
    /// vector, if this is a sub-task of a concurrent fan-out.
    pub parent_index: Option<usize>,
}

impl Task {
    pub fn new(id: TaskId, args: TaskArgs) -> Self {
        Self {
            id,
            status: TaskStatus::Inited,
            args,
            parent_index: None,
        }
    }

    pub fn task_type(&self) -> TaskType {
        self.args.task_type()
    }
}

/// A scheduler-visible operation: identity, targeting, lifecycle state,
/// and its ordered (possibly branching) task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpInfo {
    pub id: OpId,
    pub op_type: OpType,
    pub table: String,
    pub pid: Pid,
    pub parent_op_id: Option<OpId>,
    pub remote_op_id: Option<OpId>,
    pub state: OpState,
    pub created_at_nanos: u64,
    pub tasks: Vec<Task>,
    /// True if `tasks` contains a fan-out whose children complete
    /// independently (design note: parent is `Failed` iff any child is
    /// `Failed`, `Done` only once all children terminate).
    pub concurrent: bool,
}

impl OpInfo {
    pub fn new(
        id: OpId,
        op_type: OpType,
        table: impl Into<String>,
        pid: Pid,
        created_at_nanos: u64,
        tasks: Vec<Task>,
    ) -> Self {
        Self {
            id,
            op_type,
            table: table.into(),
            pid,
            parent_op_id: None,
            remote_op_id: None,
            state: OpState::Inited,
            created_at_nanos,
            tasks,
            concurrent: false,
        }
    }

    /// The earliest task eligible for dispatch: the first whose status
    /// is `Inited` or `Failed` (spec.md §4.6 step 2: "earliest task whose
    /// status ∈ {kInited, kFailed-with-retry}").
    pub fn next_runnable_task(&self) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|t| matches!(t.status, TaskStatus::Inited | TaskStatus::Failed))
    }

    /// Applies the concurrent-subtask completion rule: the OP is `Done`
    /// once every task is terminal-success, `Failed` as soon as any task
    /// is `Failed`, otherwise unchanged.
    pub fn recompute_state_from_tasks(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if self.tasks.iter().any(|t| t.status == TaskStatus::Failed) {
            self.state = OpState::Failed;
        } else if self.tasks.iter().all(|t| t.status == TaskStatus::Done) {
            self.state = OpState::Done;
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus) -> Task {
        let mut t = Task::new(
            TaskId::new(0),
            TaskArgs::DropTable {
                endpoint: Endpoint::new("e"),
                table: "t".into(),
                pid: Pid::new(0),
            },
        );
        t.status = status;
        t
    }

    #[test]
    fn op_state_advances_only_forward() {
        assert!(OpState::Inited.can_advance_to(OpState::Doing));
        assert!(OpState::Doing.can_advance_to(OpState::Done));
        assert!(!OpState::Done.can_advance_to(OpState::Doing));
        assert!(OpState::Doing.can_advance_to(OpState::Canceled));
        assert!(!OpState::Done.can_advance_to(OpState::Canceled));
    }

    #[test]
    fn op_is_done_only_when_all_tasks_done() {
        let mut op = OpInfo::new(
            OpId::new(1),
            OpType::DropTable,
            "t",
            Pid::new(0),
            0,
            vec![task(TaskStatus::Done), task(TaskStatus::Doing)],
        );
        op.state = OpState::Doing;
        op.recompute_state_from_tasks();
        assert_eq!(op.state, OpState::Doing);

        op.tasks[1].status = TaskStatus::Done;
        op.recompute_state_from_tasks();
        assert_eq!(op.state, OpState::Done);
    }

    #[test]
    fn op_fails_as_soon_as_any_task_fails() {
        let mut op = OpInfo::new(
            OpId::new(2),
            OpType::AddReplica,
            "t",
            Pid::new(0),
            0,
            vec![task(TaskStatus::Done), task(TaskStatus::Failed)],
        );
        op.state = OpState::Doing;
        op.recompute_state_from_tasks();
        assert_eq!(op.state, OpState::Failed);
    }

    #[test]
    fn next_runnable_task_skips_terminal_tasks() {
        let op = OpInfo::new(
            OpId::new(3),
            OpType::DropTable,
            "t",
            Pid::new(0),
            0,
            vec![task(TaskStatus::Done), task(TaskStatus::Inited)],
        );
        assert_eq!(op.next_runnable_task().unwrap().status, TaskStatus::Inited);
    }
}
