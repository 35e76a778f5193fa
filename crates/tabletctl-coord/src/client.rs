//! `CoordClient`: session lifecycle, the fencing distributed lock, and
//! the keep-alive background thread built on top of a [`CoordBackend`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tabletctl_types::Term;
use tracing::{info, warn};

use crate::backend::CoordBackend;
use crate::error::Result;

/// Callbacks fired on lock acquisition and loss. Boxed rather than
/// generic so `CoordClient` itself stays free of closure type
/// parameters (design note: function-dispatch over captured state).
pub type OnLocked = Box<dyn Fn(Term) + Send + Sync + 'static>;
pub type OnLostLock = Box<dyn Fn() + Send + Sync + 'static>;

struct Callbacks {
    on_locked: Option<OnLocked>,
    on_lost_lock: Option<OnLostLock>,
}

/// Wraps a [`CoordBackend`] with the session/lock/keep-alive machinery
/// every component in this workspace depends on: `OnLocked` fires once
/// per successful acquisition with the session's fencing term;
/// `OnLostLock` fires on session expiry or voluntary release.
pub struct CoordClient<B: CoordBackend + 'static> {
    backend: Arc<B>,
    holder_id: String,
    lock_path: String,
    callbacks: Arc<Mutex<Callbacks>>,
    locked: Arc<AtomicBool>,
    current_term: Arc<Mutex<Option<Term>>>,
    keep_alive_running: Arc<AtomicBool>,
    keep_alive_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<B: CoordBackend + 'static> CoordClient<B> {
    pub fn new(backend: Arc<B>, holder_id: impl Into<String>, lock_path: impl Into<String>) -> Self {
        Self {
            backend,
            holder_id: holder_id.into(),
            lock_path: lock_path.into(),
            callbacks: Arc::new(Mutex::new(Callbacks {
                on_locked: None,
                on_lost_lock: None,
            })),
            locked: Arc::new(AtomicBool::new(false)),
            current_term: Arc::new(Mutex::new(None)),
            keep_alive_running: Arc::new(AtomicBool::new(false)),
            keep_alive_handle: Mutex::new(None),
        }
    }

    pub fn on_locked(&self, callback: impl Fn(Term) + Send + Sync + 'static) {
        self.callbacks.lock().expect("callbacks lock poisoned").on_locked = Some(Box::new(callback));
    }

    pub fn on_lost_lock(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.callbacks.lock().expect("callbacks lock poisoned").on_lost_lock = Some(Box::new(callback));
    }

    pub fn is_leader(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn current_term(&self) -> Option<Term> {
        *self.current_term.lock().expect("term lock poisoned")
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Single attempt to acquire the lock. Fires `OnLocked` on success.
    /// Safe to call repeatedly; re-acquiring while already the holder is
    /// a no-op that returns the existing term.
    pub fn try_acquire(&self) -> Result<bool> {
        match self.backend.try_acquire_lock(&self.lock_path, &self.holder_id)? {
            Some(term_value) => {
                let term = Term::new(term_value);
                let became_leader = !self.locked.swap(true, Ordering::AcqRel);
                *self.current_term.lock().expect("term lock poisoned") = Some(term);
                if became_leader {
                    info!(holder = %self.holder_id, %term, "acquired coordination lock");
                    if let Some(callback) = &self.callbacks.lock().expect("callbacks lock poisoned").on_locked {
                        callback(term);
                    }
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Voluntarily releases the lock and fires `OnLostLock`.
    pub fn release(&self) {
        self.backend.release_lock(&self.lock_path, &self.holder_id);
        self.fire_lost_lock_if_was_leader();
    }

    fn fire_lost_lock_if_was_leader(&self) {
        let was_leader = self.locked.swap(false, Ordering::AcqRel);
        *self.current_term.lock().expect("term lock poisoned") = None;
        if was_leader {
            warn!(holder = %self.holder_id, "lost coordination lock");
            if let Some(callback) = &self.callbacks.lock().expect("callbacks lock poisoned").on_lost_lock {
                callback();
            }
        }
    }

    /// Spawns the keep-alive background thread: every `interval`, checks
    /// session liveness and lock ownership, contending for the lock when
    /// not held and firing `OnLostLock` on session loss. Matches the
    /// teacher's one-thread-per-responsibility pattern rather than a
    /// shared scheduler tick.
    pub fn start_keep_alive(self: &Arc<Self>, interval: Duration) {
        if self.keep_alive_running.swap(true, Ordering::AcqRel) {
            return;
        }
        let client = Arc::clone(self);
        let running = Arc::clone(&self.keep_alive_running);
        let handle = thread::Builder::new()
            .name("coord-keep-alive".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    if client.backend.is_session_alive() {
                        if !client.locked.load(Ordering::Acquire) {
                            if let Err(error) = client.try_acquire() {
                                warn!(%error, "lock acquisition attempt failed");
                            }
                        }
                    } else {
                        client.fire_lost_lock_if_was_leader();
                    }
                    thread::sleep(interval);
                }
            })
            .expect("failed to spawn coord-keep-alive thread");
        *self.keep_alive_handle.lock().expect("handle lock poisoned") = Some(handle);
    }

    pub fn stop_keep_alive(&self) {
        self.keep_alive_running.store(false, Ordering::Release);
        if let Some(handle) = self.keep_alive_handle.lock().expect("handle lock poisoned").take() {
            let _ = handle.join();
        }
    }
}

impl<B: CoordBackend + 'static> Drop for CoordClient<B> {
    fn drop(&mut self) {
        self.stop_keep_alive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn try_acquire_fires_on_locked_exactly_once() {
        let backend = Arc::new(MemoryBackend::new());
        let client = CoordClient::new(backend, "ns-a", "leader_lock");
        let fire_count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&fire_count);
        client.on_locked(move |_term| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(client.try_acquire().unwrap());
        assert!(client.try_acquire().unwrap());
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_client_cannot_acquire_held_lock() {
        let backend = Arc::new(MemoryBackend::new());
        let first = CoordClient::new(Arc::clone(&backend), "ns-a", "leader_lock");
        let second = CoordClient::new(backend, "ns-b", "leader_lock");

        assert!(first.try_acquire().unwrap());
        assert!(!second.try_acquire().unwrap());

        first.release();
        assert!(second.try_acquire().unwrap());
    }

    #[test]
    fn release_fires_on_lost_lock() {
        let backend = Arc::new(MemoryBackend::new());
        let client = CoordClient::new(backend, "ns-a", "leader_lock");
        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        client.on_lost_lock(move || flag.store(true, Ordering::SeqCst));

        client.try_acquire().unwrap();
        client.release();
        assert!(lost.load(Ordering::SeqCst));
    }
}
