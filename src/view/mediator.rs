//! Mediator surface
//!
//! A mediator is a view controller bound to at most one skin. Engine
//! listeners registered through it are remembered so `dispose` can release
//! all of them.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::bridge::{same_handler, same_node, AssetsCallback, Bridge, DisplayNode, EngineHandler};
use crate::messaging::MessageHandlers;

/// Upcast helper so trait objects can be filtered by concrete type
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct EngineListener {
    target: DisplayNode,
    event: String,
    handler: EngineHandler,
}

/// State every mediator carries
pub struct MediatorBase {
    bridge: Arc<dyn Bridge>,
    skin: RwLock<Option<DisplayNode>>,
    disposed: AtomicBool,
    listeners: Mutex<Vec<EngineListener>>,
}

impl MediatorBase {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self {
            bridge,
            skin: RwLock::new(None),
            disposed: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn with_skin(bridge: Arc<dyn Bridge>, skin: DisplayNode) -> Self {
        let base = Self::new(bridge);
        base.set_skin(skin);
        base
    }

    pub fn bridge(&self) -> Arc<dyn Bridge> {
        Arc::clone(&self.bridge)
    }

    pub fn skin(&self) -> Option<DisplayNode> {
        self.skin.read().clone()
    }

    pub fn set_skin(&self, skin: DisplayNode) {
        if !self.bridge.is_my_skin(&skin) {
            tracing::warn!(
                "[view] Skin does not belong to the '{}' bridge",
                self.bridge.bridge_type()
            );
        }
        *self.skin.write() = Some(skin);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Register an engine listener; the same (target, event, handler) twice is a no-op
    pub fn map_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        {
            let mut listeners = self.listeners.lock();
            let exists = listeners.iter().any(|l| {
                same_node(&l.target, target) && l.event == event && same_handler(&l.handler, handler)
            });
            if exists {
                return;
            }
            listeners.push(EngineListener {
                target: Arc::clone(target),
                event: event.to_string(),
                handler: Arc::clone(handler),
            });
        }
        self.bridge.map_listener(target, event, handler);
    }

    pub fn unmap_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        let removed = {
            let mut listeners = self.listeners.lock();
            let index = listeners.iter().position(|l| {
                same_node(&l.target, target) && l.event == event && same_handler(&l.handler, handler)
            });
            index.map(|index| listeners.remove(index))
        };
        if let Some(listener) = removed {
            self.bridge
                .unmap_listener(&listener.target, &listener.event, &listener.handler);
        }
    }

    pub fn unmap_all_listeners(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for listener in listeners {
            self.bridge
                .unmap_listener(&listener.target, &listener.event, &listener.handler);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Release listeners and the skin; later calls are no-ops
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.unmap_all_listeners();
        *self.skin.write() = None;
    }
}

/// A view controller.
///
/// Implementors only provide `base`; every other method has a default that
/// delegates to it. `message_handlers` is the mediator's message-sugar table.
pub trait Mediator: AsAny {
    fn base(&self) -> &MediatorBase;

    fn message_handlers() -> MessageHandlers<Self>
    where
        Self: Sized,
    {
        MessageHandlers::new()
    }

    /// Concrete type name, for diagnostics
    fn mediator_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn bridge(&self) -> Arc<dyn Bridge> {
        self.base().bridge()
    }

    fn is_disposed(&self) -> bool {
        self.base().is_disposed()
    }

    fn skin(&self) -> Option<DisplayNode> {
        self.base().skin()
    }

    fn set_skin(&self, skin: DisplayNode) {
        self.base().set_skin(skin)
    }

    fn map_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        self.base().map_listener(target, event, handler)
    }

    fn unmap_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        self.base().unmap_listener(target, event, handler)
    }

    fn unmap_all_listeners(&self) {
        self.base().unmap_all_listeners()
    }

    fn dispose(&self) {
        self.base().dispose()
    }

    /// Ask the bridge to load `urls` for this mediator
    fn load_assets(&self, urls: &[String], done: AssetsCallback)
    where
        Self: Sized,
    {
        self.base().bridge().load_assets(urls, self, done)
    }
}
