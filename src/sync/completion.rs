//! One-shot completion callback handed to transition policies.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Callback = Box<dyn FnOnce() + Send>;

struct Inner {
    label: String,
    completed: AtomicBool,
    callback: Mutex<Option<Callback>>,
}

/// Clonable handle whose callback runs at most once.
///
/// Every clone shares the same state; the first `complete` on any of them
/// runs the callback, later ones are logged and ignored.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

impl Completion {
    pub fn new<F>(label: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                label: label.into(),
                completed: AtomicBool::new(false),
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// A completion with nothing attached
    pub fn noop() -> Self {
        Self::new("noop", || {})
    }

    pub fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                "[sync] Completion '{}' invoked more than once, ignoring",
                self.inner.label
            );
            return;
        }

        let callback = self.inner.callback.lock().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.inner.label)
            .field("completed", &self.is_completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_runs_exactly_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let done = Completion::new("switch", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let copy = done.clone();

        assert!(!done.is_completed());
        done.complete();
        copy.complete();
        done.complete();

        assert!(copy.is_completed());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_complete_from_another_thread() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let done = Completion::new("open", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let remote = done.clone();
        std::thread::spawn(move || remote.complete())
            .join()
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
