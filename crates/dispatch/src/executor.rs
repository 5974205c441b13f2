//! Delivery execution contexts
//!
//! The dispatcher never inspects thread identity at runtime to decide
//! where a listener runs; it is handed a [`DispatchExecutor`] capability
//! instead. Hosts with a UI loop wrap it in this trait; everyone else
//! can use [`InlineExecutor`] or let the dispatcher own a
//! [`ThreadExecutor`].

use std::fmt;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, unbounded};

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context tasks can be scheduled onto
pub trait DispatchExecutor: Send + Sync {
    /// Schedule a task onto this context
    fn dispatch(&self, task: Task);

    /// Whether the calling thread already is this context
    ///
    /// When true, a caller may run work in place instead of scheduling
    /// it.
    fn is_current(&self) -> bool;
}

/// Executor that runs every task immediately on the calling thread
///
/// Reports itself as always current, so delivery through it is fully
/// synchronous. The default primary context for hosts without a UI
/// loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl DispatchExecutor for InlineExecutor {
    fn dispatch(&self, task: Task) {
        task()
    }

    fn is_current(&self) -> bool {
        true
    }
}

/// Executor backed by one dedicated worker thread
///
/// Tasks are queued over a channel and run in submission order, which
/// gives callers a serial delivery guarantee. Dropping the executor
/// drains the queue and joins the worker.
pub struct ThreadExecutor {
    sender: Option<Sender<Task>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl ThreadExecutor {
    /// Spawn the worker thread
    pub fn new() -> Self {
        let (sender, receiver) = unbounded::<Task>();
        let worker = thread::spawn(move || {
            while let Ok(task) = receiver.recv() {
                task();
            }
        });
        let worker_id = worker.thread().id();
        Self {
            sender: Some(sender),
            worker: Some(worker),
            worker_id,
        }
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchExecutor for ThreadExecutor {
    fn dispatch(&self, task: Task) {
        if let Some(sender) = &self.sender {
            // Fails only after shutdown, when dropping the task is the
            // right outcome anyway.
            let _ = sender.send(task);
        }
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

impl fmt::Debug for ThreadExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadExecutor")
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
