//! Kernel message types
//!
//! A message is a type string plus an ordered list of opaque params.
//! Messages are immutable once dispatched.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Any value carried by a message or a scene change
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Dispatched after every other message; param 0 is the original message
pub const MESSAGE_DISPATCHED: &str = "messageDispatched";

/// Before a scene switch/push/pop starts; param 0 is a `SceneChange`
pub const SCENE_BEFORE_CHANGE: &str = "sceneBeforeChange";

/// After a scene transition completed; param 0 is a `SceneChange`
pub const SCENE_AFTER_CHANGE: &str = "sceneAfterChange";

/// Before a popup opens; param 0 is a `PopupEvent`
pub const POPUP_BEFORE_OPEN: &str = "popupBeforeOpen";

/// After a popup finished opening; param 0 is a `PopupEvent`
pub const POPUP_AFTER_OPEN: &str = "popupAfterOpen";

/// Before a popup closes; param 0 is a `PopupEvent`
pub const POPUP_BEFORE_CLOSE: &str = "popupBeforeClose";

/// After a popup finished closing; param 0 is a `PopupEvent`
pub const POPUP_AFTER_CLOSE: &str = "popupAfterClose";

/// A kernel message
#[derive(Clone)]
pub struct Message {
    kind: String,
    params: Vec<Payload>,
}

impl Message {
    /// Create a message without params
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    /// Create a message from a type and an already-built param list
    pub fn with_params(kind: impl Into<String>, params: Vec<Payload>) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Append a param
    pub fn with_param<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.params.push(Arc::new(value));
        self
    }

    /// Append a param that is already shared
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.params.push(payload);
        self
    }

    /// Message type string
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn params(&self) -> &[Payload] {
        &self.params
    }

    /// Typed view of the param at `index`, `None` if absent or of another type
    pub fn param<T: Any>(&self, index: usize) -> Option<&T> {
        self.params.get(index).and_then(|p| p.downcast_ref::<T>())
    }

    /// The wrapped message when this is a `MESSAGE_DISPATCHED` notification
    pub fn dispatched_original(&self) -> Option<&Message> {
        if self.is(MESSAGE_DISPATCHED) {
            self.param::<Message>(0)
        } else {
            None
        }
    }

    /// Get a human-readable description of the message
    pub fn description(&self) -> String {
        match self.params.len() {
            0 => self.kind.clone(),
            1 => format!("{} (1 param)", self.kind),
            n => format!("{} ({} params)", self.kind, n),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind)
            .field("params", &self.params.len())
            .finish()
    }
}

impl From<&str> for Message {
    fn from(kind: &str) -> Self {
        Message::new(kind)
    }
}

impl From<String> for Message {
    fn from(kind: String) -> Self {
        Message::new(kind)
    }
}
