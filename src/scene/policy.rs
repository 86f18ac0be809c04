//! Scene transition policies.
//!
//! A policy only has to provide `switch`; push and pop fall back to the
//! switch pair unless overridden.

use std::time::Duration;

use super::types::SceneRef;
use crate::sync::Completion;
use crate::system::System;

pub trait ScenePolicy: Send + Sync {
    /// Called synchronously before `switch`
    fn prepare_switch(&self, _from: &SceneRef, _to: &SceneRef) {}

    /// Start the transition; `done` must be completed exactly once
    fn switch(&self, from: &SceneRef, to: &SceneRef, done: Completion);

    fn prepare_push(&self, from: &SceneRef, to: &SceneRef) {
        self.prepare_switch(from, to)
    }

    fn push(&self, from: &SceneRef, to: &SceneRef, done: Completion) {
        self.switch(from, to, done)
    }

    fn prepare_pop(&self, from: &SceneRef, to: &SceneRef) {
        self.prepare_switch(from, to)
    }

    fn pop(&self, from: &SceneRef, to: &SceneRef, done: Completion) {
        self.switch(from, to, done)
    }
}

/// Completes every transition immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneScenePolicy;

impl ScenePolicy for NoneScenePolicy {
    fn switch(&self, _from: &SceneRef, _to: &SceneRef, done: Completion) {
        done.complete();
    }
}

/// Completes each transition after a fixed time on a `System` clock
#[derive(Clone)]
pub struct TimedScenePolicy {
    system: System,
    duration: Duration,
}

impl TimedScenePolicy {
    pub fn new(system: System, duration: Duration) -> Self {
        Self { system, duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl ScenePolicy for TimedScenePolicy {
    fn switch(&self, from: &SceneRef, to: &SceneRef, done: Completion) {
        tracing::debug!(
            "[scene] Animating {} -> {} over {:?}",
            from.mediator_name(),
            to.mediator_name(),
            self.duration
        );
        self.system.set_timeout(self.duration, move || done.complete());
    }
}
