/// View layer surface
///
/// The kernel talks to a rendering engine only through `Bridge`, and to view
/// controllers only through `Mediator`. `HeadlessBridge` is an engine with an
/// in-memory display tree and no output.
pub mod bridge;
pub mod headless;
pub mod mediator;

// Re-export commonly used types
pub use bridge::{same_node, AssetsCallback, Bridge, DisplayNode, EngineHandler};
pub use headless::{HeadlessBridge, HeadlessNode};
pub use mediator::{AsAny, Mediator, MediatorBase};
