//! Olympus: application control kernel for MVC user interfaces.
//!
//! A process-wide message bus with dependency injection, command mapping and
//! mediator message sugar, plus scene-stack and popup navigation driven by
//! asynchronous transition policies. Rendering engines plug in through the
//! `Bridge` trait.

pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod popup;
pub mod scene;
pub mod sync;
pub mod system;
pub mod view;

pub use config::Config;
pub use error::{AppResult, ConfigError, CoreError, HandlerResult, LoggingError};
pub use messaging::{Command, Core, Injectable, Listener, Message, MessageHandlers, Payload};
pub use popup::{OpenOptions, Point, Popup, PopupManager, PopupPolicy, PopupRef};
pub use scene::{Scene, SceneManager, ScenePolicy, SceneRef};
pub use sync::{Completion, SyncQueue};
pub use system::{Cancelable, System};
pub use view::{Bridge, HeadlessBridge, Mediator, MediatorBase};
