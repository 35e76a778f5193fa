//! Membership Watcher (C2): turns coordination-service child-set
//! snapshots of `/tablets` and `/blob_servers` into online/offline
//! events, diffed against the last known set rather than delivered as
//! raw snapshots (spec.md §4.2).

use std::collections::BTreeSet;
use std::sync::Mutex;

use tabletctl_coord::backend::{CoordBackend, WatchEvent};
use tabletctl_coord::paths::{BLOB_SERVERS_DIR, TABLETS_DIR};
use tabletctl_types::Endpoint;
use tracing::warn;

/// A single membership transition. `startup_flag` is set on every event
/// delivered from the watcher's first snapshot, so callers can skip
/// firing recovery OPs for servers that were already online when the
/// process started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    TabletOnline { endpoint: Endpoint, startup_flag: bool },
    TabletOffline { endpoint: Endpoint, startup_flag: bool },
    BlobOnline { endpoint: Endpoint, startup_flag: bool },
    BlobOffline { endpoint: Endpoint, startup_flag: bool },
}

struct TrackedSet {
    known: BTreeSet<Endpoint>,
    seen_first_snapshot: bool,
}

impl TrackedSet {
    fn new() -> Self {
        Self {
            known: BTreeSet::new(),
            seen_first_snapshot: false,
        }
    }

    /// Computes the online/offline diff for a fresh child-name snapshot,
    /// updating `known` in place.
    fn diff(&mut self, children: Vec<String>) -> (Vec<Endpoint>, Vec<Endpoint>, bool) {
        let startup_flag = !self.seen_first_snapshot;
        self.seen_first_snapshot = true;
        let next: BTreeSet<Endpoint> = children.into_iter().map(Endpoint::new).collect();

        let online: Vec<Endpoint> = next.difference(&self.known).cloned().collect();
        let offline: Vec<Endpoint> = self.known.difference(&next).cloned().collect();
        self.known = next;
        (online, offline, startup_flag)
    }
}

/// Watches `/tablets` and `/blob_servers` and turns coordination-service
/// child-set changes into [`MembershipEvent`]s. Holds no opinion about
/// what those events should cause; `Reconciler` wires the reaction.
pub struct MembershipWatcher<B: CoordBackend> {
    backend: std::sync::Arc<B>,
    tablets: Mutex<TrackedSet>,
    blob_servers: Mutex<TrackedSet>,
}

impl<B: CoordBackend> MembershipWatcher<B> {
    pub fn new(backend: std::sync::Arc<B>) -> Self {
        Self {
            backend,
            tablets: Mutex::new(TrackedSet::new()),
            blob_servers: Mutex::new(TrackedSet::new()),
        }
    }

    /// Takes one snapshot of `/tablets` immediately (used at startup,
    /// before any watch has fired) and returns the resulting events.
    pub fn poll_tablets(&self) -> tabletctl_coord::Result<Vec<MembershipEvent>> {
        let children = self.backend.children(TABLETS_DIR)?;
        Ok(self.apply_tablets_diff(children))
    }

    pub fn poll_blob_servers(&self) -> tabletctl_coord::Result<Vec<MembershipEvent>> {
        let children = self.backend.children(BLOB_SERVERS_DIR)?;
        Ok(self.apply_blob_servers_diff(children))
    }

    fn apply_tablets_diff(&self, children: Vec<String>) -> Vec<MembershipEvent> {
        let (online, offline, startup_flag) = self.tablets.lock().expect("tablets lock poisoned").diff(children);
        online
            .into_iter()
            .map(|endpoint| MembershipEvent::TabletOnline { endpoint, startup_flag })
            .chain(
                offline
                    .into_iter()
                    .map(|endpoint| MembershipEvent::TabletOffline { endpoint, startup_flag }),
            )
            .collect()
    }

    fn apply_blob_servers_diff(&self, children: Vec<String>) -> Vec<MembershipEvent> {
        let (online, offline, startup_flag) = self.blob_servers.lock().expect("blob servers lock poisoned").diff(children);
        online
            .into_iter()
            .map(|endpoint| MembershipEvent::BlobOnline { endpoint, startup_flag })
            .chain(
                offline
                    .into_iter()
                    .map(|endpoint| MembershipEvent::BlobOffline { endpoint, startup_flag }),
            )
            .collect()
    }

    /// Registers watches on both directories and invokes `on_event` for
    /// every event a subsequent `ChildrenChanged` delivery produces. Runs
    /// until the backend reports `SessionExpired` on either watch.
    pub fn run(&self, on_event: impl Fn(MembershipEvent) + Send + Sync) -> tabletctl_coord::Result<()> {
        let tablets_rx = self.backend.watch_children(TABLETS_DIR)?;
        let blob_rx = self.backend.watch_children(BLOB_SERVERS_DIR)?;

        select_two(&tablets_rx, &blob_rx, |from_tablets, event| match event {
            WatchEvent::ChildrenChanged(children) => {
                let events = if from_tablets {
                    self.apply_tablets_diff(children)
                } else {
                    self.apply_blob_servers_diff(children)
                };
                for event in events {
                    on_event(event);
                }
                true
            }
            WatchEvent::SessionExpired => {
                warn!("membership watch session expired");
                false
            }
            _ => true,
        });
        Ok(())
    }
}

/// Minimal two-channel select loop: blocks on whichever of `a`/`b`
/// produces a message first, invoking `handle(from_a, event)`. Returns
/// once `handle` returns `false`. Kept local rather than pulling in a
/// crate for two channels.
fn select_two<T>(
    a: &std::sync::mpsc::Receiver<T>,
    b: &std::sync::mpsc::Receiver<T>,
    mut handle: impl FnMut(bool, T) -> bool,
) {
    loop {
        if let Ok(event) = a.try_recv() {
            if !handle(true, event) {
                return;
            }
            continue;
        }
        if let Ok(event) = b.try_recv() {
            if !handle(false, event) {
                return;
            }
            continue;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletctl_coord::memory::MemoryBackend;
    use tabletctl_coord::backend::NodeKind;

    #[test]
    fn first_poll_reports_every_tablet_as_online_with_startup_flag() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.create(&format!("{TABLETS_DIR}/a:9527"), vec![], NodeKind::Ephemeral).unwrap();
        let watcher = MembershipWatcher::new(backend);

        let events = watcher.poll_tablets().unwrap();
        assert_eq!(
            events,
            vec![MembershipEvent::TabletOnline { endpoint: Endpoint::new("a:9527"), startup_flag: true }]
        );
    }

    #[test]
    fn later_poll_detects_offline_transition() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.create(&format!("{TABLETS_DIR}/a:9527"), vec![], NodeKind::Ephemeral).unwrap();
        let watcher = MembershipWatcher::new(std::sync::Arc::clone(&backend));
        watcher.poll_tablets().unwrap();

        backend.delete(&format!("{TABLETS_DIR}/a:9527")).unwrap();
        let events = watcher.poll_tablets().unwrap();
        assert_eq!(
            events,
            vec![MembershipEvent::TabletOffline { endpoint: Endpoint::new("a:9527"), startup_flag: false }]
        );
    }
}
