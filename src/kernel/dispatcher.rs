//! Named worker-pool dispatchers. Generalizes the teacher's
//! one-tokio-task-per-actor model into a pool of OS threads pulling ready
//! cells off a shared run queue, each cell processing at most
//! `throughput` user messages before yielding the worker back to the pool.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::config::DispatcherConfig;
use crate::kernel::kernel_ref::RunnableCell;

/// A pool of worker threads draining a shared queue of runnable cells.
/// Every `ActorSystem` has at least the distinguished `"default"` and
/// `"system"` dispatchers; user code may register additional named ones
/// (e.g. to isolate a blocking actor family from the rest of the system).
#[derive(Clone)]
pub struct Dispatcher {
    name: Arc<str>,
    tx: Sender<Arc<dyn RunnableCell>>,
    throughput: u32,
}

impl Dispatcher {
    pub fn new(name: &str, cfg: &DispatcherConfig) -> Dispatcher {
        let (tx, rx): (Sender<Arc<dyn RunnableCell>>, Receiver<Arc<dyn RunnableCell>>) =
            unbounded();
        let throughput = cfg.throughput;

        for worker_id in 0..cfg.pool_size.max(1) {
            let rx = rx.clone();
            let name = name.to_string();
            thread::Builder::new()
                .name(format!("swarmcore-{}-{}", name, worker_id))
                .spawn(move || {
                    while let Ok(cell) = rx.recv() {
                        cell.run(throughput);
                    }
                })
                .expect("failed to spawn dispatcher worker thread");
        }

        Dispatcher {
            name: Arc::from(name),
            tx,
            throughput,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn throughput(&self) -> u32 {
        self.throughput
    }

    /// Enqueue a cell for execution. Idempotent: the cell tracks its own
    /// `is_scheduled`/`set_scheduled` flag, so callers are expected to have
    /// already claimed scheduling rights via a compare-and-swap before
    /// calling this (see `KernelRef::schedule`).
    pub fn execute(&self, cell: Arc<dyn RunnableCell>) {
        let _ = self.tx.send(cell);
    }
}
