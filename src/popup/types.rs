use std::fmt;
use std::sync::Arc;

use super::policy::PopupPolicy;
use crate::view::Mediator;

pub type PopupRef = Arc<dyn Popup>;

/// Screen position an open or close animation starts from or heads to
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A dialog managed by `PopupManager`; hooks default to no-ops
pub trait Popup: Mediator {
    /// Open/close policy for this popup; `None` uses the manager default
    fn policy(&self) -> Option<Arc<dyn PopupPolicy>> {
        None
    }

    fn on_before_open(&self, _is_modal: bool, _from: Option<Point>) {}

    fn on_after_open(&self, _is_modal: bool, _from: Option<Point>) {}

    fn on_before_close(&self, _to: Option<Point>) {}

    fn on_after_close(&self, _to: Option<Point>) {}
}

pub fn same_popup(a: &PopupRef, b: &PopupRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Param of the four popup messages
#[derive(Clone)]
pub struct PopupEvent {
    pub popup: PopupRef,
    pub is_modal: bool,
    /// `from` when opening, `to` when closing
    pub point: Option<Point>,
}

impl fmt::Debug for PopupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupEvent")
            .field("popup", &self.popup.mediator_name())
            .field("is_modal", &self.is_modal)
            .field("point", &self.point)
            .finish()
    }
}

/// Options for `PopupManager::open`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    pub modal: Option<bool>,
    pub from: Option<Point>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = Some(modal);
        self
    }

    pub fn from_point(mut self, point: Point) -> Self {
        self.from = Some(point);
        self
    }
}
