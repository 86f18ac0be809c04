//! Scene stack state machine.
//!
//! Every transition takes the manager's slot on its `SyncQueue` and holds it
//! until the policy completes, so at most one transition is in flight and
//! later calls wait their turn.
//!
//! A panicking lifecycle hook is logged and the transition carries on. A
//! panicking policy abandons its transition and frees the slot, leaving the
//! stack as it was.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::policy::{NoneScenePolicy, ScenePolicy};
use super::types::{same_scene, ChangeKind, SceneChange, SceneRef};
use crate::config::Config;
use crate::messaging::handlers::panic_message;
use crate::messaging::{Core, Message, Payload, SCENE_AFTER_CHANGE, SCENE_BEFORE_CHANGE};
use crate::sync::{Completion, SyncQueue};

pub struct SceneManager {
    core: Arc<Core>,
    stack: Arc<RwLock<Vec<SceneRef>>>,
    default_policy: Arc<RwLock<Arc<dyn ScenePolicy>>>,
    queue: SyncQueue,
    queue_name: Arc<str>,
}

impl SceneManager {
    pub fn new(core: Arc<Core>, config: &Config) -> Self {
        Self::with_queue(core, SyncQueue::new(), config)
    }

    /// Serialize transitions on a queue shared with other components
    pub fn with_queue(core: Arc<Core>, queue: SyncQueue, config: &Config) -> Self {
        Self {
            core,
            stack: Arc::new(RwLock::new(Vec::new())),
            default_policy: Arc::new(RwLock::new(Arc::new(NoneScenePolicy))),
            queue,
            queue_name: Arc::from(config.scene_queue_name.as_str()),
        }
    }

    /// Policy for scenes that do not bring their own
    pub fn set_default_policy(&self, policy: Arc<dyn ScenePolicy>) {
        *self.default_policy.write() = policy;
    }

    /// Top of the stack
    pub fn get_cur_scene(&self) -> Option<SceneRef> {
        self.stack.read().last().cloned()
    }

    pub fn get_active_count(&self) -> usize {
        self.stack.read().len()
    }

    /// Snapshot of the stack, bottom first
    pub fn scenes(&self) -> Vec<SceneRef> {
        self.stack.read().clone()
    }

    /// Whether a transition is running or queued
    pub fn is_transitioning(&self) -> bool {
        self.queue.is_busy(&self.queue_name)
    }

    /// Replace the current scene; the old one is disposed once the
    /// transition completes
    pub fn switch_scene(&self, scene: SceneRef, data: Option<Payload>) {
        self.enqueue(ChangeKind::Switch, scene, data);
    }

    /// Put `scene` on top, keeping the current one beneath it
    pub fn push_scene(&self, scene: SceneRef, data: Option<Payload>) {
        self.enqueue(ChangeKind::Push, scene, data);
    }

    /// Remove `scene` if it is the current top and reveal the one beneath.
    ///
    /// A stale reference, or the last remaining scene, leaves the stack
    /// untouched.
    pub fn pop_scene(&self, scene: SceneRef, data: Option<Payload>) {
        self.enqueue(ChangeKind::Pop, scene, data);
    }

    fn enqueue(&self, kind: ChangeKind, scene: SceneRef, data: Option<Payload>) {
        let this = self.clone();
        self.queue.wait(&self.queue_name, move || {
            let started = match kind {
                ChangeKind::Switch | ChangeKind::Push => this.begin_enter(kind, scene, data),
                ChangeKind::Pop => this.begin_pop(scene, data),
            };
            if !started {
                this.queue.notify(&this.queue_name);
            }
        });
    }

    fn begin_enter(&self, kind: ChangeKind, to: SceneRef, data: Option<Payload>) -> bool {
        if to.is_disposed() {
            tracing::warn!(
                "[scene] {} is disposed, ignoring {}",
                to.mediator_name(),
                kind.as_str()
            );
            return false;
        }
        let from = {
            let stack = self.stack.read();
            if stack.iter().any(|s| same_scene(s, &to)) {
                tracing::warn!(
                    "[scene] {} is already on the stack, ignoring {}",
                    to.mediator_name(),
                    kind.as_str()
                );
                return false;
            }
            stack.last().cloned()
        };

        let change = SceneChange {
            kind,
            from,
            to,
            data,
        };
        self.announce_and_run(change, |policy, from, to, done| match kind {
            ChangeKind::Push => {
                policy.prepare_push(from, to);
                policy.push(from, to, done);
            }
            _ => {
                policy.prepare_switch(from, to);
                policy.switch(from, to, done);
            }
        });
        true
    }

    fn begin_pop(&self, scene: SceneRef, data: Option<Payload>) -> bool {
        let to = {
            let stack = self.stack.read();
            match stack.last() {
                Some(top) if same_scene(top, &scene) => {}
                _ => {
                    tracing::debug!(
                        "[scene] {} is not the current scene, ignoring pop",
                        scene.mediator_name()
                    );
                    return false;
                }
            }
            if stack.len() < 2 {
                tracing::warn!(
                    "[scene] Refusing to pop the last scene {}",
                    scene.mediator_name()
                );
                return false;
            }
            Arc::clone(&stack[stack.len() - 2])
        };

        let change = SceneChange {
            kind: ChangeKind::Pop,
            from: Some(scene),
            to,
            data,
        };
        self.announce_and_run(change, |policy, from, to, done| {
            policy.prepare_pop(from, to);
            policy.pop(from, to, done);
        });
        true
    }

    /// Broadcast the change, run the before hooks and hand off to the policy
    fn announce_and_run<F>(&self, change: SceneChange, start: F)
    where
        F: FnOnce(&dyn ScenePolicy, &SceneRef, &SceneRef, Completion),
    {
        tracing::info!("[scene] Begin {}", change.describe());
        self.core
            .dispatch(Message::new(SCENE_BEFORE_CHANGE).with_param(change.clone()));

        let data = change.data.as_ref();
        if let Some(from) = &change.from {
            guarded("on_before_out", from, || from.on_before_out(&change.to, data));
        }
        guarded("on_before_in", &change.to, || {
            change.to.on_before_in(change.from.as_ref(), data)
        });

        let settled = Arc::new(AtomicBool::new(false));
        let label = change.describe();
        let Some(from) = change.from.clone() else {
            self.finish(change, &settled);
            return;
        };

        // Pop animates with the policy of the scene leaving, the others with
        // the policy of the scene entering
        let owner = match change.kind {
            ChangeKind::Pop => Arc::clone(&from),
            _ => Arc::clone(&change.to),
        };
        let to = Arc::clone(&change.to);
        let done = {
            let this = self.clone();
            let settled = Arc::clone(&settled);
            Completion::new(label.clone(), move || this.finish(change, &settled))
        };

        let started = catch_unwind(AssertUnwindSafe(|| {
            let policy = owner
                .policy()
                .unwrap_or_else(|| self.default_policy.read().clone());
            start(policy.as_ref(), &from, &to, done);
        }));
        if let Err(panic) = started {
            tracing::error!(
                "[scene] Policy panicked during {}, abandoning it: {}",
                label,
                panic_message(panic.as_ref())
            );
            self.release(&settled);
        }
    }

    /// Apply the change to the stack once the policy completed
    fn finish(&self, change: SceneChange, settled: &AtomicBool) {
        if settled.load(Ordering::Acquire) {
            tracing::debug!(
                "[scene] Ignoring completion of abandoned {}",
                change.describe()
            );
            return;
        }
        {
            let mut stack = self.stack.write();
            match change.kind {
                ChangeKind::Switch => {
                    if change.from.is_some() {
                        stack.pop();
                    }
                    stack.push(Arc::clone(&change.to));
                }
                ChangeKind::Push => stack.push(Arc::clone(&change.to)),
                ChangeKind::Pop => {
                    stack.pop();
                }
            }
        }

        let data = change.data.as_ref();
        if let Some(from) = &change.from {
            guarded("on_after_out", from, || from.on_after_out(&change.to, data));
        }
        guarded("on_after_in", &change.to, || {
            change.to.on_after_in(change.from.as_ref(), data)
        });

        tracing::info!(
            "[scene] Finished {} ({} active)",
            change.describe(),
            self.get_active_count()
        );
        self.core
            .dispatch(Message::new(SCENE_AFTER_CHANGE).with_param(change.clone()));

        if change.kind != ChangeKind::Push {
            if let Some(from) = &change.from {
                guarded("dispose", from, || self.core.dispose_mediator(from));
            }
        }

        self.release(settled);
    }

    /// Free the queue slot, at most once per transition
    fn release(&self, settled: &AtomicBool) {
        if !settled.swap(true, Ordering::AcqRel) {
            self.queue.notify(&self.queue_name);
        }
    }
}

/// Run a scene hook, logging a panic instead of unwinding into the queue
fn guarded<F: FnOnce()>(hook: &str, scene: &SceneRef, f: F) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::error!(
            "[scene] {} of {} panicked: {}",
            hook,
            scene.mediator_name(),
            panic_message(panic.as_ref())
        );
    }
}

impl Clone for SceneManager {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            stack: Arc::clone(&self.stack),
            default_policy: Arc::clone(&self.default_policy),
            queue: self.queue.clone(),
            queue_name: Arc::clone(&self.queue_name),
        }
    }
}
