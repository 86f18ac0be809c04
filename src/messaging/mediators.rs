//! Registry of live mediators, consulted only for message-sugar delivery.
//!
//! Entries hold weak references: the registry never keeps a mediator alive.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};

use super::handlers::BoundSugar;
use super::message::Message;
use crate::view::Mediator;

struct MediatorEntry {
    id: usize,
    name: &'static str,
    mediator: Weak<dyn Mediator>,
    sugar: Option<BoundSugar>,
}

/// Address-based identity shared by every `Arc` to the same mediator
pub(crate) fn mediator_id<M: ?Sized>(mediator: &Arc<M>) -> usize {
    Arc::as_ptr(mediator).cast::<()>() as usize
}

pub struct MediatorRegistry {
    entries: RwLock<Vec<MediatorEntry>>,
}

impl MediatorRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register `mediator`; registering it twice is a no-op
    pub fn map<M: Mediator>(&self, mediator: &Arc<M>) {
        let id = mediator_id(mediator);
        let mut entries = self.entries.write();
        entries.retain(|e| e.mediator.strong_count() > 0);
        if entries.iter().any(|e| e.id == id) {
            return;
        }

        let handlers = M::message_handlers();
        let sugar: Option<BoundSugar> = if handlers.is_empty() {
            None
        } else {
            let target = Arc::downgrade(mediator);
            Some(Arc::new(move |msg: &Message| {
                let mediator = target.upgrade()?;
                if mediator.is_disposed() {
                    return None;
                }
                handlers.handle(&*mediator, msg)
            }))
        };

        let weak: Weak<dyn Mediator> = Arc::downgrade(mediator) as Weak<dyn Mediator>;
        entries.push(MediatorEntry {
            id,
            name: mediator.mediator_name(),
            mediator: weak,
            sugar,
        });
    }

    /// Unregister `mediator`; no-op when absent
    pub fn unmap<M: ?Sized>(&self, mediator: &Arc<M>) {
        let id = mediator_id(mediator);
        self.entries.write().retain(|e| e.id != id);
    }

    pub fn contains<M: ?Sized>(&self, mediator: &Arc<M>) -> bool {
        let id = mediator_id(mediator);
        self.entries.read().iter().any(|e| e.id == id)
    }

    /// Live registered mediators in registration order
    pub fn live(&self) -> Vec<Arc<dyn Mediator>> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| e.mediator.upgrade())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|e| e.mediator.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn sugar_snapshot(&self) -> Vec<(&'static str, BoundSugar)> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| e.sugar.clone().map(|s| (e.name, s)))
            .collect()
    }
}

impl Default for MediatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
