//! In-process `CoordBackend` test double: a mutex-guarded tree that
//! models session liveness, ephemeral nodes, watch delivery, and lock
//! contention deterministically. Used by every crate's test suite and by
//! the simulated end-to-end scenarios in `tabletctl-server`.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

use crate::backend::{CoordBackend, NodeKind, VersionedValue, WatchEvent};
use crate::error::{CoordError, Result};

#[derive(Debug, Clone)]
struct Node {
    value: VersionedValue,
    ephemeral: bool,
}

#[derive(Default)]
struct LockState {
    holder: Option<String>,
    term: u64,
}

struct Inner {
    nodes: BTreeMap<String, Node>,
    children_watchers: HashMap<String, Vec<Sender<WatchEvent>>>,
    data_watchers: HashMap<String, Vec<Sender<WatchEvent>>>,
    locks: HashMap<String, LockState>,
    session_alive: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            children_watchers: HashMap::new(),
            data_watchers: HashMap::new(),
            locks: HashMap::new(),
            session_alive: true,
        }
    }

    fn parent_of(path: &str) -> Option<&str> {
        path.rsplit_once('/').map(|(parent, _)| parent)
    }

    fn direct_children(&self, path: &str) -> Vec<String> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut names: Vec<String> = self
            .nodes
            .keys()
            .filter_map(|key| {
                let suffix = key.strip_prefix(prefix.as_str())?;
                if suffix.is_empty() || suffix.contains('/') {
                    None
                } else {
                    Some(suffix.to_string())
                }
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn notify_children(&mut self, path: &str) {
        let Some(parent) = Self::parent_of(path) else {
            return;
        };
        let names = self.direct_children(parent);
        if let Some(senders) = self.children_watchers.get(parent) {
            for sender in senders {
                let _ = sender.send(WatchEvent::ChildrenChanged(names.clone()));
            }
        }
    }

    fn notify_data(&self, path: &str, event: WatchEvent) {
        if let Some(senders) = self.data_watchers.get(path) {
            for sender in senders {
                let _ = sender.send(event.clone());
            }
        }
    }
}

/// An in-memory coordination-service backend. Clone to share the same
/// underlying tree across multiple `CoordClient`s simulating separate
/// name-server processes contending for the same lock.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    /// Test hook: forces the session to appear dead, as if the ensemble
    /// had expired it. The keep-alive job observes this on its next
    /// check.
    pub fn kill_session(&self) {
        self.inner.lock().expect("memory backend lock poisoned").session_alive = false;
    }

    /// Test hook: restores session liveness.
    pub fn revive_session(&self) {
        self.inner.lock().expect("memory backend lock poisoned").session_alive = true;
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordBackend for MemoryBackend {
    fn open_session(&self) -> Result<()> {
        self.inner.lock().expect("memory backend lock poisoned").session_alive = true;
        Ok(())
    }

    fn close_session(&self) {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        inner.session_alive = false;
        let ephemeral_paths: Vec<String> = inner
            .nodes
            .iter()
            .filter(|(_, node)| node.ephemeral)
            .map(|(path, _)| path.clone())
            .collect();
        for path in ephemeral_paths {
            inner.nodes.remove(&path);
            inner.notify_children(&path);
        }
    }

    fn is_session_alive(&self) -> bool {
        self.inner.lock().expect("memory backend lock poisoned").session_alive
    }

    fn create(&self, path: &str, data: Vec<u8>, kind: NodeKind) -> Result<()> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::SessionExpired);
        }
        if inner.nodes.contains_key(path) {
            return Err(CoordError::NodeExists(path.to_string()));
        }
        inner.nodes.insert(
            path.to_string(),
            Node {
                value: VersionedValue { data, version: 0 },
                ephemeral: kind == NodeKind::Ephemeral,
            },
        );
        inner.notify_children(path);
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<VersionedValue>> {
        let inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::NotConnected);
        }
        Ok(inner.nodes.get(path).map(|n| n.value.clone()))
    }

    fn set(&self, path: &str, data: Vec<u8>, expected_version: Option<u64>) -> Result<u64> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::SessionExpired);
        }
        let new_version = {
            let node = inner
                .nodes
                .get_mut(path)
                .ok_or_else(|| CoordError::NodeMissing(path.to_string()))?;
            if let Some(expected) = expected_version {
                if node.value.version != expected {
                    return Err(CoordError::VersionConflict {
                        path: path.to_string(),
                        expected,
                        actual: node.value.version,
                    });
                }
            }
            node.value.data = data;
            node.value.version += 1;
            node.value.version
        };
        let snapshot = inner.nodes.get(path).map(|n| n.value.clone()).unwrap();
        inner.notify_data(path, WatchEvent::DataChanged(snapshot));
        Ok(new_version)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::SessionExpired);
        }
        if inner.nodes.remove(path).is_none() {
            return Err(CoordError::NodeMissing(path.to_string()));
        }
        inner.notify_data(path, WatchEvent::NodeDeleted);
        inner.notify_children(path);
        Ok(())
    }

    fn children(&self, path: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::NotConnected);
        }
        Ok(inner.direct_children(path))
    }

    fn watch_children(&self, path: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        let (tx, rx) = mpsc::channel();
        inner
            .children_watchers
            .entry(path.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    fn watch_data(&self, path: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        let (tx, rx) = mpsc::channel();
        inner
            .data_watchers
            .entry(path.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    fn try_acquire_lock(&self, path: &str, holder: &str) -> Result<Option<u64>> {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        if !inner.session_alive {
            return Err(CoordError::SessionExpired);
        }
        let lock = inner.locks.entry(path.to_string()).or_default();
        match &lock.holder {
            Some(current) if current == holder => Ok(Some(lock.term)),
            Some(_) => Ok(None),
            None => {
                lock.term += 1;
                lock.holder = Some(holder.to_string());
                Ok(Some(lock.term))
            }
        }
    }

    fn release_lock(&self, path: &str, holder: &str) {
        let mut inner = self.inner.lock().expect("memory backend lock poisoned");
        if let Some(lock) = inner.locks.get_mut(path) {
            if lock.holder.as_deref() == Some(holder) {
                lock.holder = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_round_trips() {
        let backend = MemoryBackend::new();
        backend
            .create("table_data/t", b"hello".to_vec(), NodeKind::Persistent)
            .unwrap();
        let value = backend.get("table_data/t").unwrap().unwrap();
        assert_eq!(value.data, b"hello");
        assert_eq!(value.version, 0);
    }

    #[test]
    fn create_twice_fails_with_node_exists() {
        let backend = MemoryBackend::new();
        backend
            .create("tablets/a", vec![], NodeKind::Ephemeral)
            .unwrap();
        let err = backend
            .create("tablets/a", vec![], NodeKind::Ephemeral)
            .unwrap_err();
        assert!(matches!(err, CoordError::NodeExists(_)));
    }

    #[test]
    fn set_with_stale_expected_version_conflicts() {
        let backend = MemoryBackend::new();
        backend
            .create("table_data/t", vec![1], NodeKind::Persistent)
            .unwrap();
        backend.set("table_data/t", vec![2], Some(0)).unwrap();
        let err = backend
            .set("table_data/t", vec![3], Some(0))
            .unwrap_err();
        assert!(matches!(err, CoordError::VersionConflict { .. }));
    }

    #[test]
    fn only_one_holder_acquires_lock_at_a_time() {
        let backend = MemoryBackend::new();
        let first = backend.try_acquire_lock("leader_lock", "ns-a").unwrap();
        let second = backend.try_acquire_lock("leader_lock", "ns-b").unwrap();
        assert!(first.is_some());
        assert!(second.is_none());

        backend.release_lock("leader_lock", "ns-a");
        let third = backend.try_acquire_lock("leader_lock", "ns-b").unwrap();
        assert!(third.unwrap() > first.unwrap());
    }

    #[test]
    fn closing_session_removes_ephemeral_nodes_only() {
        let backend = MemoryBackend::new();
        backend
            .create("table_data/t", vec![], NodeKind::Persistent)
            .unwrap();
        backend
            .create("tablets/a", vec![], NodeKind::Ephemeral)
            .unwrap();
        backend.close_session();
        backend.open_session().unwrap();
        assert!(backend.get("table_data/t").unwrap().is_some());
        assert!(backend.get("tablets/a").unwrap().is_none());
    }

    #[test]
    fn children_watch_fires_on_create() {
        let backend = MemoryBackend::new();
        let rx = backend.watch_children("tablets").unwrap();
        backend
            .create("tablets/a", vec![], NodeKind::Ephemeral)
            .unwrap();
        let event = rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();
        assert_eq!(event, WatchEvent::ChildrenChanged(vec!["a".to_string()]));
    }
}
