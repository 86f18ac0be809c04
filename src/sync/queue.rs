//! Named serialization queues.
//!
//! Operations waiting on the same name run strictly one at a time: the first
//! runs immediately, each later one starts when `notify` reports the
//! previous one finished.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type Task = Box<dyn FnOnce() + Send>;

/// Handle identifying one `wait` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(u64);

struct Operation {
    id: OperationId,
    /// `None` once the operation has started
    task: Option<Task>,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    queues: HashMap<String, VecDeque<Operation>>,
}

/// Shared set of named FIFO queues
pub struct SyncQueue {
    state: Arc<Mutex<QueueState>>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    /// Run `task` now if `name` is idle, otherwise after every operation
    /// queued before it has been notified.
    pub fn wait<F>(&self, name: &str, task: F) -> OperationId
    where
        F: FnOnce() + Send + 'static,
    {
        let (id, run_now) = {
            let mut state = self.state.lock();
            let id = OperationId(state.next_id);
            state.next_id += 1;

            let queue = state.queues.entry(name.to_string()).or_default();
            if queue.is_empty() {
                queue.push_back(Operation { id, task: None });
                (id, Some(task))
            } else {
                queue.push_back(Operation {
                    id,
                    task: Some(Box::new(task)),
                });
                tracing::debug!(
                    "[sync] Queued operation on '{}' ({} pending)",
                    name,
                    queue.len() - 1
                );
                (id, None)
            }
        };

        if let Some(task) = run_now {
            task();
        }
        id
    }

    /// Finish the running operation of `name` and start the next one
    pub fn notify(&self, name: &str) {
        let next = {
            let mut state = self.state.lock();
            let Some(queue) = state.queues.get_mut(name) else {
                tracing::debug!("[sync] notify on idle queue '{}'", name);
                return;
            };

            queue.pop_front();
            match queue.front_mut() {
                Some(head) => head.task.take(),
                None => {
                    state.queues.remove(name);
                    None
                }
            }
        };

        if let Some(task) = next {
            task();
        }
    }

    /// Whether `id` is running or still waiting in any queue
    pub fn is_operating(&self, id: OperationId) -> bool {
        self.state
            .lock()
            .queues
            .values()
            .any(|q| q.iter().any(|op| op.id == id))
    }

    /// Whether an operation is running on `name`
    pub fn is_busy(&self, name: &str) -> bool {
        self.state.lock().queues.contains_key(name)
    }

    /// Operations on `name` still waiting to start
    pub fn pending(&self, name: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(name)
            .map_or(0, |q| q.len().saturating_sub(1))
    }
}

impl Default for SyncQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SyncQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}
