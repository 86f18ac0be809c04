//! Injection registry: one live instance per type-identity key.

use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use super::handlers::{BoundSugar, MessageHandlers};
use super::message::Message;

/// A type the kernel can construct and register as a singleton.
///
/// `message_handlers` is the type's message-sugar table; the default has none.
pub trait Injectable: Send + Sync + 'static {
    fn message_handlers() -> MessageHandlers<Self>
    where
        Self: Sized,
    {
        MessageHandlers::new()
    }
}

struct InjectEntry {
    key: TypeId,
    type_name: &'static str,
    /// Holds an `Arc<K>` for the registered key `K`
    value: Box<dyn Any + Send + Sync>,
    sugar: Option<BoundSugar>,
}

/// Keyed singleton store
pub struct InjectionRegistry {
    entries: RwLock<Vec<InjectEntry>>,
}

impl InjectionRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register `value` under key `K` with an explicit sugar table.
    ///
    /// Re-registering a key replaces the previous instance in place; the old
    /// instance is only dropped, never disposed.
    pub fn insert<K>(&self, value: Arc<K>, handlers: MessageHandlers<K>)
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let sugar: Option<BoundSugar> = if handlers.is_empty() {
            None
        } else {
            let target = Arc::clone(&value);
            Some(Arc::new(move |msg: &Message| handlers.handle(&*target, msg)))
        };

        let entry = InjectEntry {
            key: TypeId::of::<K>(),
            type_name: type_name::<K>(),
            value: Box::new(value),
            sugar,
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => {
                tracing::debug!("[core] Replacing injected value for {}", entry.type_name);
                *existing = entry;
            }
            None => {
                tracing::debug!("[core] Injected value for {}", entry.type_name);
                entries.push(entry);
            }
        }
    }

    /// Remove key `K`; no-op when absent
    pub fn remove<K: ?Sized + 'static>(&self) {
        let key = TypeId::of::<K>();
        self.entries.write().retain(|e| e.key != key);
    }

    /// Look up key `K`; `None` when unregistered
    pub fn get<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        let key = TypeId::of::<K>();
        self.entries
            .read()
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.downcast_ref::<Arc<K>>())
            .cloned()
    }

    pub fn contains<K: ?Sized + 'static>(&self) -> bool {
        let key = TypeId::of::<K>();
        self.entries.read().iter().any(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the bound sugar handlers in registration order
    pub(crate) fn sugar_snapshot(&self) -> Vec<(&'static str, BoundSugar)> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| e.sugar.clone().map(|s| (e.type_name, s)))
            .collect()
    }
}

impl Default for InjectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[derive(Debug, PartialEq)]
    struct Settings(u32);

    #[test]
    fn test_get_unregistered_is_none() {
        let registry = InjectionRegistry::new();
        assert!(registry.get::<Settings>().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_overwrites_same_key() {
        let registry = InjectionRegistry::new();
        registry.insert(Arc::new(Settings(1)), MessageHandlers::new());
        registry.insert(Arc::new(Settings(2)), MessageHandlers::new());

        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.get::<Settings>().unwrap(), Settings(2));
    }

    #[test]
    fn test_trait_object_key() {
        let registry = InjectionRegistry::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        registry.insert::<dyn Greeter>(greeter, MessageHandlers::new());

        assert_eq!(registry.get::<dyn Greeter>().unwrap().greet(), "hello");
        // Keyed by the interface, not the concrete type
        assert!(!registry.contains::<English>());
    }

    #[test]
    fn test_remove() {
        let registry = InjectionRegistry::new();
        registry.insert(Arc::new(Settings(1)), MessageHandlers::new());
        registry.remove::<Settings>();
        registry.remove::<Settings>();

        assert!(registry.get::<Settings>().is_none());
    }

    #[test]
    fn test_sugar_snapshot_binds_target() {
        let registry = InjectionRegistry::new();
        registry.insert(
            Arc::new(Settings(9)),
            MessageHandlers::new().on("read", |s: &Settings, _| {
                anyhow::ensure!(s.0 == 9, "wrong target");
                Ok(())
            }),
        );
        registry.insert(Arc::new(English), MessageHandlers::new());

        let sugar = registry.sugar_snapshot();
        assert_eq!(sugar.len(), 1);
        let result = (sugar[0].1)(&Message::new("read"));
        assert!(matches!(result, Some(Ok(()))));
    }
}
