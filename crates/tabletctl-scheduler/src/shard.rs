//! Deterministic OP-to-shard routing and the per-shard dispatch queue.
//!
//! Spec invariant I5: two OPs on the same partition must never execute
//! concurrently. Routing an OP by `pid % shard_count` to a fixed worker
//! and running each shard's queue FIFO on a single dedicated thread gives
//! that for free, the same way the teacher's `CoreRouter` pins a stream's
//! writes to one `CoreRuntime` worker.
//!
//! Task *execution* (the tablet RPC or catalog mutation an OP's current
//! task performs) is handed off to a bounded `rayon` pool so one slow
//! tablet doesn't stall dispatch of unrelated shards.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tabletctl_types::{OpId, Pid};
use tracing::{debug, info};

/// Routes an OP to a shard by partition id. Two OPs with the same `pid`
/// always land on the same shard; shard count is fixed for the lifetime
/// of the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count > 0, "shard count must be positive");
        Self { shard_count }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn shard_for(&self, pid: Pid) -> usize {
        (pid.as_u32() as usize) % self.shard_count
    }
}

struct ShardQueue {
    mutex: Mutex<ShardQueueState>,
    condvar: Condvar,
}

struct ShardQueueState {
    pending: VecDeque<OpId>,
    shutting_down: bool,
}

/// One shard's FIFO of pending OP ids plus the worker thread draining it.
/// `enqueue` never blocks; the worker blocks on the condvar when the
/// queue is empty.
pub struct ShardHandle {
    queue: Arc<ShardQueue>,
    worker: Option<JoinHandle<()>>,
}

impl ShardHandle {
    /// Spawns the shard's worker thread. `on_op` is invoked once per
    /// dequeued OP id and is expected to block until that OP reaches a
    /// terminal state before returning, so the next dequeue on this
    /// shard never races an OP still in flight (spec invariant I5).
    pub fn spawn(shard_index: usize, on_op: impl Fn(OpId) + Send + 'static) -> Self {
        let queue = Arc::new(ShardQueue {
            mutex: Mutex::new(ShardQueueState {
                pending: VecDeque::new(),
                shutting_down: false,
            }),
            condvar: Condvar::new(),
        });
        let worker_queue = Arc::clone(&queue);
        let worker = std::thread::Builder::new()
            .name(format!("op-shard-{shard_index}"))
            .spawn(move || shard_loop(shard_index, worker_queue, on_op))
            .expect("failed to spawn shard worker thread");
        Self {
            queue,
            worker: Some(worker),
        }
    }

    pub fn enqueue(&self, op_id: OpId) {
        let mut state = self.queue.mutex.lock().expect("shard queue lock poisoned");
        state.pending.push_back(op_id);
        self.queue.condvar.notify_one();
    }

    pub fn shutdown(&mut self) {
        {
            let mut state = self.queue.mutex.lock().expect("shard queue lock poisoned");
            state.shutting_down = true;
            self.queue.condvar.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ShardHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn shard_loop(shard_index: usize, queue: Arc<ShardQueue>, on_op: impl Fn(OpId)) {
    info!(shard_index, "op shard worker started");
    loop {
        let op_id = {
            let mut state = queue.mutex.lock().expect("shard queue lock poisoned");
            loop {
                if let Some(op_id) = state.pending.pop_front() {
                    break Some(op_id);
                }
                if state.shutting_down {
                    break None;
                }
                state = queue.condvar.wait(state).expect("shard queue lock poisoned");
            }
        };
        match op_id {
            Some(op_id) => {
                debug!(shard_index, %op_id, "dispatching op");
                on_op(op_id);
            }
            None => break,
        }
    }
    info!(shard_index, "op shard worker stopped");
}

/// The fixed set of shard workers, one per `ShardRouter` slot.
pub struct ShardPool {
    router: ShardRouter,
    shards: Vec<ShardHandle>,
}

impl ShardPool {
    pub fn new(router: ShardRouter, on_op: impl Fn(usize, OpId) + Send + Sync + 'static) -> Self {
        let on_op = Arc::new(on_op);
        let shards = (0..router.shard_count())
            .map(|shard_index| {
                let on_op = Arc::clone(&on_op);
                ShardHandle::spawn(shard_index, move |op_id| on_op(shard_index, op_id))
            })
            .collect();
        Self { router, shards }
    }

    pub fn enqueue(&self, pid: Pid, op_id: OpId) {
        let shard_index = self.router.shard_for(pid);
        self.shards[shard_index].enqueue(op_id);
    }

    pub fn shutdown(&mut self) {
        for shard in &mut self.shards {
            shard.shutdown();
        }
    }
}

impl Drop for ShardPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn same_pid_always_routes_to_same_shard() {
        let router = ShardRouter::new(4);
        let pid = Pid::new(7);
        let shard = router.shard_for(pid);
        for _ in 0..10 {
            assert_eq!(router.shard_for(pid), shard);
        }
    }

    #[test]
    fn shard_pool_delivers_enqueued_ops_in_fifo_order() {
        let (tx, rx) = mpsc::channel();
        let router = ShardRouter::new(2);
        let pool = ShardPool::new(router, move |_shard, op_id| {
            tx.send(op_id).expect("receiver dropped");
        });
        pool.enqueue(Pid::new(0), OpId::new(1));
        pool.enqueue(Pid::new(0), OpId::new(2));
        assert_eq!(rx.recv().unwrap(), OpId::new(1));
        assert_eq!(rx.recv().unwrap(), OpId::new(2));
    }
}
