use std::time::Duration;

use super::types::{Point, PopupRef};
use crate::sync::Completion;
use crate::system::System;

/// Open and close animation for popups.
///
/// Both operations must complete `done` exactly once.
pub trait PopupPolicy: Send + Sync {
    fn open(&self, popup: &PopupRef, from: Option<Point>, done: Completion);

    fn close(&self, popup: &PopupRef, to: Option<Point>, done: Completion);
}

/// Opens and closes instantly
#[derive(Debug, Clone, Copy, Default)]
pub struct NonePopupPolicy;

impl PopupPolicy for NonePopupPolicy {
    fn open(&self, _popup: &PopupRef, _from: Option<Point>, done: Completion) {
        done.complete();
    }

    fn close(&self, _popup: &PopupRef, _to: Option<Point>, done: Completion) {
        done.complete();
    }
}

/// Completes after a fixed time on a `System` clock
#[derive(Clone)]
pub struct TimedPopupPolicy {
    system: System,
    open_duration: Duration,
    close_duration: Duration,
}

impl TimedPopupPolicy {
    pub fn new(system: System, duration: Duration) -> Self {
        Self {
            system,
            open_duration: duration,
            close_duration: duration,
        }
    }

    pub fn with_close_duration(mut self, duration: Duration) -> Self {
        self.close_duration = duration;
        self
    }
}

impl PopupPolicy for TimedPopupPolicy {
    fn open(&self, popup: &PopupRef, _from: Option<Point>, done: Completion) {
        tracing::debug!(
            "[popup] Opening {} over {:?}",
            popup.mediator_name(),
            self.open_duration
        );
        self.system.set_timeout(self.open_duration, move || done.complete());
    }

    fn close(&self, popup: &PopupRef, _to: Option<Point>, done: Completion) {
        tracing::debug!(
            "[popup] Closing {} over {:?}",
            popup.mediator_name(),
            self.close_duration
        );
        self.system.set_timeout(self.close_duration, move || done.complete());
    }
}
