//! Named periodic background jobs run only while this process holds the
//! name-server lock (spec.md §4.7): `CheckZkClient`, `UpdateTableStatus`,
//! `SchedMakeSnapshot`, `DeleteDoneOP`, `CheckClusterInfo`,
//! `DistributeTabletMode`. Each is one OS thread on a fixed interval,
//! same shape as `CoordClient`'s keep-alive thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A single named periodic job. `stop` is cooperative: the run loop
/// checks it once per tick, so shutdown completes within one interval.
pub struct PeriodicJob {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicJob {
    /// Spawns `tick` on a named thread, invoked once immediately and
    /// then every `interval` until [`PeriodicJob::stop`] is called.
    pub fn spawn(name: impl Into<String>, interval: Duration, tick: impl Fn() + Send + 'static) -> Self {
        let name = name.into();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                while thread_running.load(Ordering::Acquire) {
                    tick();
                    thread::sleep(interval);
                }
            })
            .expect("failed to spawn periodic job thread");
        Self {
            name,
            running,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PeriodicJob {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn job_ticks_until_stopped() {
        let counter = Arc::new(AtomicU32::new(0));
        let job_counter = Arc::clone(&counter);
        let mut job = PeriodicJob::spawn("test-job", Duration::from_millis(5), move || {
            job_counter.fetch_add(1, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(30));
        job.stop();
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }
}
