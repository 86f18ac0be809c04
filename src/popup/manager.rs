//! Open-popup bookkeeping.
//!
//! A popup counts as open from the moment its open animation completes until
//! the moment its close starts. It cannot be opened again while its close
//! animation runs, and once closed it is disposed for good.

use parking_lot::RwLock;
use std::sync::Arc;

use super::policy::{NonePopupPolicy, PopupPolicy};
use super::types::{same_popup, OpenOptions, Point, Popup, PopupEvent, PopupRef};
use crate::config::Config;
use crate::messaging::{
    Core, Message, POPUP_AFTER_CLOSE, POPUP_AFTER_OPEN, POPUP_BEFORE_CLOSE, POPUP_BEFORE_OPEN,
};
use crate::sync::Completion;
use crate::view::AsAny;

struct OpenedPopup {
    popup: PopupRef,
    is_modal: bool,
}

#[derive(Default)]
struct PopupState {
    opened: Vec<OpenedPopup>,
    /// Popups whose open animation is still running
    opening: Vec<PopupRef>,
    /// Popups whose close animation is still running
    closing: Vec<PopupRef>,
}

pub struct PopupManager {
    core: Arc<Core>,
    state: Arc<RwLock<PopupState>>,
    default_policy: Arc<RwLock<Arc<dyn PopupPolicy>>>,
    modal_by_default: bool,
}

impl PopupManager {
    pub fn new(core: Arc<Core>, config: &Config) -> Self {
        Self {
            core,
            state: Arc::new(RwLock::new(PopupState::default())),
            default_policy: Arc::new(RwLock::new(Arc::new(NonePopupPolicy))),
            modal_by_default: config.popup_modal_by_default,
        }
    }

    /// Policy for popups that do not bring their own
    pub fn set_default_policy(&self, policy: Arc<dyn PopupPolicy>) {
        *self.default_policy.write() = policy;
    }

    /// Snapshot of the open popups in opening order
    pub fn get_opened(&self) -> Vec<PopupRef> {
        self.state
            .read()
            .opened
            .iter()
            .map(|o| Arc::clone(&o.popup))
            .collect()
    }

    /// Snapshot of the open popups whose concrete type is `P`
    pub fn get_opened_of<P: Popup>(&self) -> Vec<Arc<P>> {
        self.get_opened()
            .into_iter()
            .filter_map(|popup| AsAny::into_any_arc(popup).downcast::<P>().ok())
            .collect()
    }

    pub fn is_open(&self, popup: &PopupRef) -> bool {
        self.state
            .read()
            .opened
            .iter()
            .any(|o| same_popup(&o.popup, popup))
    }

    /// Open popups that were opened as modal
    pub fn modal_count(&self) -> usize {
        self.state.read().opened.iter().filter(|o| o.is_modal).count()
    }

    /// Start opening `popup`; it joins the open set once its policy completes.
    ///
    /// Opening a popup that is open, opening, closing or already disposed
    /// is ignored.
    pub fn open(&self, popup: PopupRef, options: OpenOptions) -> PopupRef {
        if popup.is_disposed() {
            tracing::warn!(
                "[popup] {} is disposed, ignoring open",
                popup.mediator_name()
            );
            return popup;
        }
        {
            let mut state = self.state.write();
            let busy = state.opened.iter().any(|o| same_popup(&o.popup, &popup))
                || state.opening.iter().any(|p| same_popup(p, &popup))
                || state.closing.iter().any(|p| same_popup(p, &popup));
            if busy {
                tracing::debug!(
                    "[popup] {} is open or animating, ignoring open",
                    popup.mediator_name()
                );
                return popup;
            }
            state.opening.push(Arc::clone(&popup));
        }

        let is_modal = options.modal.unwrap_or(self.modal_by_default);
        let event = PopupEvent {
            popup: Arc::clone(&popup),
            is_modal,
            point: options.from,
        };
        tracing::info!(
            "[popup] Opening {} (modal: {})",
            popup.mediator_name(),
            is_modal
        );
        self.core
            .dispatch(Message::new(POPUP_BEFORE_OPEN).with_param(event.clone()));
        popup.on_before_open(is_modal, options.from);

        let policy = self.policy_for(&popup);
        let this = self.clone();
        let done = Completion::new(format!("open {}", popup.mediator_name()), move || {
            this.finish_open(event)
        });
        policy.open(&popup, options.from, done);
        popup
    }

    fn finish_open(&self, event: PopupEvent) {
        {
            let mut state = self.state.write();
            state.opening.retain(|p| !same_popup(p, &event.popup));
            state.opened.push(OpenedPopup {
                popup: Arc::clone(&event.popup),
                is_modal: event.is_modal,
            });
        }

        event.popup.on_after_open(event.is_modal, event.point);
        self.core
            .dispatch(Message::new(POPUP_AFTER_OPEN).with_param(event));
    }

    /// Close an open popup; it is disposed once its policy completes.
    ///
    /// Closing a popup that is not open is ignored.
    pub fn close(&self, popup: PopupRef, to: Option<Point>) -> PopupRef {
        let removed = {
            let mut state = self.state.write();
            let index = state
                .opened
                .iter()
                .position(|o| same_popup(&o.popup, &popup));
            let removed = index.map(|index| state.opened.remove(index));
            if removed.is_some() {
                state.closing.push(Arc::clone(&popup));
            }
            removed
        };
        let Some(removed) = removed else {
            tracing::debug!("[popup] {} is not open, ignoring close", popup.mediator_name());
            return popup;
        };

        let event = PopupEvent {
            popup: Arc::clone(&popup),
            is_modal: removed.is_modal,
            point: to,
        };
        tracing::info!("[popup] Closing {}", popup.mediator_name());
        self.core
            .dispatch(Message::new(POPUP_BEFORE_CLOSE).with_param(event.clone()));
        popup.on_before_close(to);

        let policy = self.policy_for(&popup);
        let this = self.clone();
        let done = Completion::new(format!("close {}", popup.mediator_name()), move || {
            this.finish_close(event)
        });
        policy.close(&popup, to, done);
        popup
    }

    fn finish_close(&self, event: PopupEvent) {
        self.state
            .write()
            .closing
            .retain(|p| !same_popup(p, &event.popup));

        event.popup.on_after_close(event.point);
        self.core
            .dispatch(Message::new(POPUP_AFTER_CLOSE).with_param(event.clone()));
        self.core.dispose_mediator(&event.popup);
    }

    fn policy_for(&self, popup: &PopupRef) -> Arc<dyn PopupPolicy> {
        popup
            .policy()
            .unwrap_or_else(|| self.default_policy.read().clone())
    }
}

impl Clone for PopupManager {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            state: Arc::clone(&self.state),
            default_policy: Arc::clone(&self.default_policy),
            modal_by_default: self.modal_by_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::TimedPopupPolicy;
    use crate::system::System;
    use crate::view::{HeadlessBridge, Mediator, MediatorBase};
    use parking_lot::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Alert {
        base: MediatorBase,
        log: Log,
    }

    impl Mediator for Alert {
        fn base(&self) -> &MediatorBase {
            &self.base
        }
    }

    impl Popup for Alert {
        fn on_before_open(&self, is_modal: bool, _from: Option<Point>) {
            self.log.lock().push(format!("before_open:{}", is_modal));
        }

        fn on_after_open(&self, is_modal: bool, _from: Option<Point>) {
            self.log.lock().push(format!("after_open:{}", is_modal));
        }

        fn on_before_close(&self, _to: Option<Point>) {
            self.log.lock().push("before_close".to_string());
        }

        fn on_after_close(&self, _to: Option<Point>) {
            self.log.lock().push("after_close".to_string());
        }
    }

    struct Toast {
        base: MediatorBase,
    }

    impl Mediator for Toast {
        fn base(&self) -> &MediatorBase {
            &self.base
        }
    }

    impl Popup for Toast {}

    fn manager() -> PopupManager {
        PopupManager::new(Core::detached(), &Config::default())
    }

    fn alert(log: &Log) -> PopupRef {
        Arc::new(Alert {
            base: MediatorBase::new(Arc::new(HeadlessBridge::new())),
            log: log.clone(),
        })
    }

    fn toast() -> PopupRef {
        Arc::new(Toast {
            base: MediatorBase::new(Arc::new(HeadlessBridge::new())),
        })
    }

    #[test]
    fn test_open_then_close() {
        let popups = manager();
        let log: Log = Arc::default();
        let p = alert(&log);

        popups.open(p.clone(), OpenOptions::new());
        assert!(popups.is_open(&p));
        assert_eq!(popups.modal_count(), 1);

        popups.close(p.clone(), None);
        assert!(!popups.is_open(&p));
        assert!(popups.get_opened().is_empty());
        assert!(p.is_disposed());
        assert_eq!(
            *log.lock(),
            vec!["before_open:true", "after_open:true", "before_close", "after_close"]
        );
    }

    #[test]
    fn test_get_opened_filters_by_type() {
        let popups = manager();
        let log: Log = Arc::default();
        let a = alert(&log);
        let t1 = toast();
        let t2 = toast();

        popups.open(a, OpenOptions::new());
        popups.open(t1, OpenOptions::new().modal(false));
        popups.open(t2, OpenOptions::new().modal(false));

        assert_eq!(popups.get_opened().len(), 3);
        assert_eq!(popups.get_opened_of::<Toast>().len(), 2);
        assert_eq!(popups.get_opened_of::<Alert>().len(), 1);
        assert_eq!(popups.modal_count(), 1);
    }

    #[test]
    fn test_get_opened_is_a_snapshot() {
        let popups = manager();
        let p = toast();
        popups.open(p.clone(), OpenOptions::new());

        let snapshot = popups.get_opened();
        popups.close(p, None);

        assert_eq!(snapshot.len(), 1);
        assert!(popups.get_opened().is_empty());
    }

    #[test]
    fn test_close_unknown_popup_is_noop() {
        let popups = manager();
        let log: Log = Arc::default();
        let p = alert(&log);

        popups.close(p.clone(), None);

        assert!(log.lock().is_empty());
        assert!(!p.is_disposed());
    }

    #[test]
    fn test_timed_policy_defers_membership() {
        let popups = manager();
        let system = System::new();
        popups.set_default_policy(Arc::new(TimedPopupPolicy::new(
            system.clone(),
            Duration::from_millis(200),
        )));
        let log: Log = Arc::default();
        let p = alert(&log);

        popups.open(p.clone(), OpenOptions::new().from_point(Point::new(10.0, 20.0)));
        // Ignored while the first open is running
        popups.open(p.clone(), OpenOptions::new());
        assert!(!popups.is_open(&p));

        system.tick(Duration::from_millis(200));
        assert!(popups.is_open(&p));
        assert_eq!(*log.lock(), vec!["before_open:true", "after_open:true"]);

        popups.close(p.clone(), None);
        assert!(!popups.is_open(&p));
        assert!(!p.is_disposed());

        system.tick(Duration::from_millis(200));
        assert!(p.is_disposed());
    }

    #[test]
    fn test_reopen_during_close_is_ignored() {
        let popups = manager();
        let system = System::new();
        popups.set_default_policy(Arc::new(TimedPopupPolicy::new(
            system.clone(),
            Duration::from_millis(50),
        )));
        let p = toast();

        popups.open(p.clone(), OpenOptions::new());
        system.tick(Duration::from_millis(50));
        popups.close(p.clone(), None);
        system.tick(Duration::from_millis(20));

        popups.open(p.clone(), OpenOptions::new());
        system.tick(Duration::from_millis(50));

        assert!(p.is_disposed());
        assert!(!popups.is_open(&p));
        assert!(popups.get_opened().is_empty());
    }

    #[test]
    fn test_disposed_popup_is_not_reopened() {
        let popups = manager();
        let log: Log = Arc::default();
        let p = alert(&log);

        popups.open(p.clone(), OpenOptions::new());
        popups.close(p.clone(), None);
        assert!(p.is_disposed());
        log.lock().clear();

        popups.open(p.clone(), OpenOptions::new());

        assert!(!popups.is_open(&p));
        assert!(log.lock().is_empty());
        assert!(popups
            .get_opened()
            .iter()
            .all(|open| !open.is_disposed()));
    }

    #[test]
    fn test_messages_follow_hooks() {
        let popups = manager();
        let (rx, _id) = popups.core.subscribe();
        let p = toast();

        popups.open(p.clone(), OpenOptions::new().modal(false));
        popups.close(p, None);

        let kinds: Vec<String> = rx
            .try_iter()
            .filter(|m| m.param::<PopupEvent>(0).is_some())
            .map(|m| m.kind().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                POPUP_BEFORE_OPEN,
                POPUP_AFTER_OPEN,
                POPUP_BEFORE_CLOSE,
                POPUP_AFTER_CLOSE
            ]
        );
    }
}
