/// Scene navigation
///
/// `SceneManager` keeps a stack of scenes whose top is the visible one.
/// Transitions go through a `ScenePolicy`, which completes asynchronously:
///
/// ```text
///  switch/push/pop ──> SCENE_BEFORE_CHANGE ──> before hooks ──> policy
///                                                                 │
///                                                      Completion │
///                                                                 ▼
///       dispose old <── SCENE_AFTER_CHANGE <── after hooks <── stack update
/// ```
pub mod manager;
pub mod policy;
pub mod types;

pub use manager::SceneManager;
pub use policy::{NoneScenePolicy, ScenePolicy, TimedScenePolicy};
pub use types::{same_scene, ChangeKind, Scene, SceneChange, SceneRef};
