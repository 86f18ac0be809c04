/// Popup management
///
/// `PopupManager` tracks which popups are open and drives their open and
/// close animations through a `PopupPolicy`.
pub mod manager;
pub mod policy;
pub mod types;

pub use manager::PopupManager;
pub use policy::{NonePopupPolicy, PopupPolicy, TimedPopupPolicy};
pub use types::{same_popup, OpenOptions, Point, Popup, PopupEvent, PopupRef};
