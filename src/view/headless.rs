//! In-memory bridge: a display tree with no rendering, used by the demo
//! binary and by tests.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::bridge::{same_handler, same_node, AssetsCallback, Bridge, DisplayNode, EngineHandler};
use super::mediator::Mediator;

/// A node of the headless display tree
pub struct HeadlessNode {
    id: u64,
    label: String,
    parent: Mutex<Weak<HeadlessNode>>,
    children: Mutex<Vec<Arc<HeadlessNode>>>,
}

impl HeadlessNode {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

struct MappedListener {
    target: DisplayNode,
    event: String,
    handler: EngineHandler,
}

pub struct HeadlessBridge {
    next_id: AtomicU64,
    listeners: Mutex<Vec<MappedListener>>,
    loaded: Mutex<Vec<String>>,
    missing: Mutex<HashSet<String>>,
}

impl HeadlessBridge {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
            loaded: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
        }
    }

    /// Create a labelled node
    pub fn create_node(&self, label: &str) -> DisplayNode {
        let node: DisplayNode = Arc::new(HeadlessNode {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            parent: Mutex::new(Weak::new()),
            children: Mutex::new(Vec::new()),
        });
        node
    }

    /// Labels of the children of `parent`, in order
    pub fn child_labels(&self, parent: &DisplayNode) -> Vec<String> {
        Self::node(parent)
            .map(|p| p.children.lock().iter().map(|c| c.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Make later `load_assets` calls for `url` fail
    pub fn mark_missing(&self, url: &str) {
        self.missing.lock().insert(url.to_string());
    }

    pub fn loaded_assets(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Fire `event` on `target`; returns how many handlers ran
    pub fn emit(&self, target: &DisplayNode, event: &str) -> usize {
        let handlers: Vec<EngineHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|l| same_node(&l.target, target) && l.event == event)
            .map(|l| Arc::clone(&l.handler))
            .collect();
        for handler in &handlers {
            handler(target, event);
        }
        handlers.len()
    }

    fn node(node: &DisplayNode) -> Option<Arc<HeadlessNode>> {
        Arc::clone(node).downcast::<HeadlessNode>().ok()
    }

    fn detach(child: &Arc<HeadlessNode>) {
        let parent = child.parent.lock().upgrade();
        if let Some(parent) = parent {
            parent.children.lock().retain(|c| !Arc::ptr_eq(c, child));
        }
        *child.parent.lock() = Weak::new();
    }
}

impl Default for HeadlessBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for HeadlessBridge {
    fn bridge_type(&self) -> &str {
        "headless"
    }

    fn is_my_skin(&self, node: &DisplayNode) -> bool {
        node.is::<HeadlessNode>()
    }

    fn get_parent(&self, node: &DisplayNode) -> Option<DisplayNode> {
        let parent = Self::node(node)?.parent.lock().upgrade()?;
        let parent: DisplayNode = parent;
        Some(parent)
    }

    fn get_child_index(&self, parent: &DisplayNode, child: &DisplayNode) -> Option<usize> {
        let parent = Self::node(parent)?;
        let child = Self::node(child)?;
        let index = parent.children.lock().iter().position(|c| Arc::ptr_eq(c, &child));
        index
    }

    fn get_child_count(&self, parent: &DisplayNode) -> usize {
        Self::node(parent).map_or(0, |p| p.children.lock().len())
    }

    fn add_child(&self, parent: &DisplayNode, child: &DisplayNode) {
        let count = self.get_child_count(parent);
        self.add_child_at(parent, child, count);
    }

    fn add_child_at(&self, parent: &DisplayNode, child: &DisplayNode, index: usize) {
        let (Some(parent), Some(child)) = (Self::node(parent), Self::node(child)) else {
            tracing::warn!("[view] add_child_at called with a foreign node");
            return;
        };
        Self::detach(&child);
        {
            let mut children = parent.children.lock();
            let index = index.min(children.len());
            children.insert(index, Arc::clone(&child));
        }
        *child.parent.lock() = Arc::downgrade(&parent);
    }

    fn remove_child(&self, parent: &DisplayNode, child: &DisplayNode) {
        if let Some(index) = self.get_child_index(parent, child) {
            self.remove_child_at(parent, index);
        }
    }

    fn remove_child_at(&self, parent: &DisplayNode, index: usize) -> Option<DisplayNode> {
        let parent = Self::node(parent)?;
        let removed = {
            let mut children = parent.children.lock();
            if index >= children.len() {
                return None;
            }
            children.remove(index)
        };
        *removed.parent.lock() = Weak::new();
        let removed: DisplayNode = removed;
        Some(removed)
    }

    fn create_empty_display(&self) -> DisplayNode {
        self.create_node("")
    }

    fn map_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        self.listeners.lock().push(MappedListener {
            target: Arc::clone(target),
            event: event.to_string(),
            handler: Arc::clone(handler),
        });
    }

    fn unmap_listener(&self, target: &DisplayNode, event: &str, handler: &EngineHandler) {
        let mut listeners = self.listeners.lock();
        if let Some(index) = listeners.iter().position(|l| {
            same_node(&l.target, target) && l.event == event && same_handler(&l.handler, handler)
        }) {
            listeners.remove(index);
        }
    }

    fn load_assets(&self, urls: &[String], mediator: &dyn Mediator, done: AssetsCallback) {
        let missing: Vec<String> = {
            let missing = self.missing.lock();
            urls.iter().filter(|u| missing.contains(*u)).cloned().collect()
        };
        if !missing.is_empty() {
            done(Err(anyhow::anyhow!(
                "{} could not load: {}",
                mediator.mediator_name(),
                missing.join(", ")
            )));
            return;
        }
        self.loaded.lock().extend(urls.iter().cloned());
        done(Ok(()));
    }
}
