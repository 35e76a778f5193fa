//! The `CoordBackend` trait: the minimal surface a coordination-service
//! driver (ZooKeeper, etcd, or an in-memory test double) must provide for
//! `CoordClient` to build sessions, watches, and a fencing lock on top of.

use crate::error::Result;

/// Whether a node survives the creating session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Persistent,
    Ephemeral,
}

/// A node's value together with its write version, used for optimistic
/// compare-and-set (`set` with `expected_version`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub data: Vec<u8>,
    pub version: u64,
}

/// An event delivered to a registered watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The child-name set of a watched directory changed; carries the
    /// new full set, not a diff — `tabletctl-reconciler::membership`
    /// computes the diff itself.
    ChildrenChanged(Vec<String>),
    /// A watched node's data changed.
    DataChanged(VersionedValue),
    /// A watched node was deleted.
    NodeDeleted,
    /// The session backing this watch expired; the watch will not fire
    /// again until re-registered after reconnect.
    SessionExpired,
}

/// Minimal operations a coordination-service driver must implement.
/// Every method is synchronous and blocking: callers (the scheduler's
/// shard workers, the reconciler's periodic jobs) are expected to call
/// these off any lock they hold, never from inside one (spec §5: no
/// lock held across I/O).
pub trait CoordBackend: Send + Sync {
    /// Opens a session against the ensemble. Implementations may treat
    /// this as a no-op if already connected.
    fn open_session(&self) -> Result<()>;

    fn close_session(&self);

    /// True if the current session is believed live. Used by the
    /// keep-alive job; a `false` here does not by itself fire
    /// `OnLostLock` — only an actual failed operation or explicit
    /// `SessionExpired` watch event does.
    fn is_session_alive(&self) -> bool;

    /// Creates `path` (and any missing ancestor directories) with
    /// `data`. Fails with `CoordError::NodeExists` if `path` already
    /// exists.
    fn create(&self, path: &str, data: Vec<u8>, kind: NodeKind) -> Result<()>;

    /// Reads `path`. `Ok(None)` if it does not exist.
    fn get(&self, path: &str) -> Result<Option<VersionedValue>>;

    /// Overwrites `path`. If `expected_version` is `Some`, fails with
    /// `CoordError::VersionConflict` unless the current version matches
    /// (optimistic concurrency for `UpdateTableInfo`).
    fn set(&self, path: &str, data: Vec<u8>, expected_version: Option<u64>) -> Result<u64>;

    fn delete(&self, path: &str) -> Result<()>;

    /// Lists the immediate child names of `path`. Empty if the node has
    /// no children or does not exist.
    fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Registers interest in changes to `path`'s children. Returns a
    /// receiver that yields one [`WatchEvent`] per change; the backend
    /// is responsible for re-arming the watch after each delivery until
    /// the session is lost.
    fn watch_children(&self, path: &str) -> Result<std::sync::mpsc::Receiver<WatchEvent>>;

    /// Registers interest in changes to `path`'s data.
    fn watch_data(&self, path: &str) -> Result<std::sync::mpsc::Receiver<WatchEvent>>;

    /// Attempts to acquire a reentrant lock at `path` on behalf of
    /// `holder`. On success returns the fencing term assigned to this
    /// acquisition (strictly greater than any term previously returned
    /// for this lock path). Returns `Ok(None)` if another holder
    /// currently holds the lock.
    fn try_acquire_lock(&self, path: &str, holder: &str) -> Result<Option<u64>>;

    /// Releases a lock previously acquired by `holder`. A no-op if
    /// `holder` does not currently hold it.
    fn release_lock(&self, path: &str, holder: &str);
}
