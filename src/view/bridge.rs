//! Rendering-engine bridge interface.
//!
//! The kernel never draws; it only reaches the display tree through this
//! trait. Concrete engines supply an implementation.

use std::any::Any;
use std::sync::Arc;

use super::mediator::Mediator;

/// Opaque engine-native display node
pub type DisplayNode = Arc<dyn Any + Send + Sync>;

/// Engine event callback: (target node, event name)
pub type EngineHandler = Arc<dyn Fn(&DisplayNode, &str) + Send + Sync>;

/// Completion of an asset load; `Err` carries the load failure
pub type AssetsCallback = Box<dyn FnOnce(anyhow::Result<()>) + Send>;

/// Whether two handles point at the same display node
pub fn same_node(a: &DisplayNode, b: &DisplayNode) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Whether two handles point at the same engine handler
pub fn same_handler(a: &EngineHandler, b: &EngineHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

pub trait Bridge: Send + Sync {
    /// Engine name, e.g. "headless"
    fn bridge_type(&self) -> &str;

    /// Whether `node` belongs to this engine
    fn is_my_skin(&self, node: &DisplayNode) -> bool;

    fn get_parent(&self, node: &DisplayNode) -> Option<DisplayNode>;

    fn get_child_index(&self, parent: &DisplayNode, child: &DisplayNode) -> Option<usize>;

    fn get_child_count(&self, parent: &DisplayNode) -> usize;

    fn add_child(&self, parent: &DisplayNode, child: &DisplayNode);

    fn add_child_at(&self, parent: &DisplayNode, child: &DisplayNode, index: usize);

    fn remove_child(&self, parent: &DisplayNode, child: &DisplayNode);

    fn remove_child_at(&self, parent: &DisplayNode, index: usize) -> Option<DisplayNode>;

    fn create_empty_display(&self) -> DisplayNode;

    fn map_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler);

    fn unmap_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler);

    /// Load `urls` on behalf of `mediator`; `done` must be called exactly once
    fn load_assets(&self, urls: &[String], mediator: &dyn Mediator, done: AssetsCallback);
}
