use std::fmt;
use std::sync::Arc;

use super::policy::ScenePolicy;
use crate::messaging::Payload;
use crate::view::Mediator;

pub type SceneRef = Arc<dyn Scene>;

/// A full-screen view managed by `SceneManager`.
///
/// Hooks default to no-ops. `from` is absent when the scene enters an empty
/// stack.
pub trait Scene: Mediator {
    /// Transition policy for this scene; `None` uses the manager default
    fn policy(&self) -> Option<Arc<dyn ScenePolicy>> {
        None
    }

    fn on_before_in(&self, _from: Option<&SceneRef>, _data: Option<&Payload>) {}

    fn on_after_in(&self, _from: Option<&SceneRef>, _data: Option<&Payload>) {}

    fn on_before_out(&self, _to: &SceneRef, _data: Option<&Payload>) {}

    fn on_after_out(&self, _to: &SceneRef, _data: Option<&Payload>) {}
}

pub fn same_scene(a: &SceneRef, b: &SceneRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Switch,
    Push,
    Pop,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Switch => "switch",
            ChangeKind::Push => "push",
            ChangeKind::Pop => "pop",
        }
    }
}

/// Param of `SCENE_BEFORE_CHANGE` and `SCENE_AFTER_CHANGE`
#[derive(Clone)]
pub struct SceneChange {
    pub kind: ChangeKind,
    pub from: Option<SceneRef>,
    pub to: SceneRef,
    pub data: Option<Payload>,
}

impl SceneChange {
    pub fn describe(&self) -> String {
        format!(
            "{} {} -> {}",
            self.kind.as_str(),
            self.from.as_ref().map_or("(none)", |s| s.mediator_name()),
            self.to.mediator_name()
        )
    }
}

impl fmt::Debug for SceneChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneChange")
            .field("kind", &self.kind)
            .field("from", &self.from.as_ref().map(|s| s.mediator_name()))
            .field("to", &self.to.mediator_name())
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
