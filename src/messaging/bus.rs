//! The messaging kernel
//!
//! Routes every dispatched message through injected values, registered
//! mediators, mapped commands and explicit listeners, in that order, and
//! then forwards it to message taps.

use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::commands::{Command, CommandRegistry};
use super::handlers::{isolate, Listener, MessageHandlers, Stage};
use super::injector::{Injectable, InjectionRegistry};
use super::mediators::MediatorRegistry;
use super::message::{Message, MESSAGE_DISPATCHED};
use crate::config::Config;
use crate::error::CoreError;
use crate::view::Mediator;

static CORE: OnceCell<Arc<Core>> = OnceCell::new();

/// Subscriber ID for tracking message taps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<Message>,
}

/// Process-wide message bus, injector and registry
pub struct Core {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    injector: InjectionRegistry,
    commands: CommandRegistry,
    mediators: MediatorRegistry,
    subscribers: RwLock<Vec<Subscriber>>,
    next_subscriber_id: RwLock<usize>,
    emit_dispatch_notifications: bool,
}

impl Core {
    /// Create the process-wide kernel with default settings
    pub fn init() -> Result<Arc<Core>, CoreError> {
        Self::init_with(&Config::default())
    }

    /// Create the process-wide kernel; fails if one already exists
    pub fn init_with(config: &Config) -> Result<Arc<Core>, CoreError> {
        let core = Arc::new(Core::with_config(config));
        CORE.set(Arc::clone(&core))
            .map_err(|_| CoreError::AlreadyInitialized)?;
        tracing::info!(
            "[core] Kernel initialized (dispatch notifications: {})",
            config.emit_dispatch_notifications
        );
        Ok(core)
    }

    /// The process-wide kernel, once `init` succeeded
    pub fn global() -> Option<Arc<Core>> {
        CORE.get().cloned()
    }

    pub(crate) fn with_config(config: &Config) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            injector: InjectionRegistry::new(),
            commands: CommandRegistry::new(),
            mediators: MediatorRegistry::new(),
            subscribers: RwLock::new(Vec::new()),
            next_subscriber_id: RwLock::new(0),
            emit_dispatch_notifications: config.emit_dispatch_notifications,
        }
    }

    /// A kernel outside the global slot, for unit tests
    #[cfg(test)]
    pub(crate) fn detached() -> Arc<Core> {
        Arc::new(Core::with_config(&Config::default()))
    }

    /// Deliver `msg` synchronously to every receiver.
    ///
    /// A receiver that fails or panics is logged and skipped; the rest still
    /// run. Receivers registered during delivery see only later messages.
    pub fn dispatch(&self, msg: impl Into<Message>) {
        let msg = msg.into();
        tracing::trace!("[core] Dispatch {}", msg.description());

        self.deliver(&msg);
        self.publish(&msg);

        if self.emit_dispatch_notifications && !msg.is(MESSAGE_DISPATCHED) {
            self.dispatch(Message::new(MESSAGE_DISPATCHED).with_param(msg));
        }
    }

    fn deliver(&self, msg: &Message) {
        let kind = msg.kind();

        for (name, sugar) in self.injector.sugar_snapshot() {
            isolate(Stage::Inject, kind, name, || sugar(msg).unwrap_or(Ok(())));
        }

        for (name, sugar) in self.mediators.sugar_snapshot() {
            isolate(Stage::Mediator, kind, name, || sugar(msg).unwrap_or(Ok(())));
        }

        for command in self.commands.snapshot(kind) {
            isolate(Stage::Command, kind, command.name(), || command.run(msg));
        }

        let listeners = self
            .listeners
            .read()
            .get(kind)
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            isolate(Stage::Listener, kind, "listener", || listener.call(msg));
        }
    }

    fn publish(&self, msg: &Message) {
        let subscribers = self.subscribers.read();

        for subscriber in subscribers.iter() {
            // Closed tap, nothing to do
            let _ = subscriber.sender.try_send(msg.clone());
        }
    }

    /// Register `listener` for `kind`; already registered is a no-op
    pub fn listen(&self, kind: &str, listener: &Listener) {
        let mut listeners = self.listeners.write();
        let list = listeners.entry(kind.to_string()).or_default();
        if !list.iter().any(|l| l.same_as(listener)) {
            list.push(listener.clone());
        }
    }

    /// Remove `listener` from `kind`; no-op when absent
    pub fn unlisten(&self, kind: &str, listener: &Listener) {
        let mut listeners = self.listeners.write();
        if let Some(list) = listeners.get_mut(kind) {
            if let Some(index) = list.iter().position(|l| l.same_as(listener)) {
                list.remove(index);
            }
            if list.is_empty() {
                listeners.remove(kind);
            }
        }
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.read().get(kind).map_or(0, Vec::len)
    }

    /// Construct `T` and register it under its own type
    pub fn map_inject<T: Injectable + Default>(&self) -> Arc<T> {
        let value = Arc::new(T::default());
        self.map_inject_value(Arc::clone(&value));
        value
    }

    /// Register an existing value under its own type
    pub fn map_inject_value<T: Injectable>(&self, value: Arc<T>) {
        self.injector.insert(value, T::message_handlers());
    }

    /// Register a value under key `K`, usually a trait object type
    pub fn map_inject_value_as<K>(&self, value: Arc<K>, handlers: MessageHandlers<K>)
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.injector.insert(value, handlers);
    }

    pub fn unmap_inject<K: ?Sized + 'static>(&self) {
        self.injector.remove::<K>();
    }

    pub fn get_inject<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        self.injector.get::<K>()
    }

    /// Run a fresh `C` for every later message of `kind`
    pub fn map_command<C: Command>(&self, kind: &str) {
        self.commands.map::<C>(kind);
    }

    pub fn unmap_command<C: Command>(&self, kind: &str) {
        self.commands.unmap::<C>(kind);
    }

    pub fn map_mediator<M: Mediator>(&self, mediator: &Arc<M>) {
        self.mediators.map(mediator);
    }

    pub fn unmap_mediator<M: ?Sized>(&self, mediator: &Arc<M>) {
        self.mediators.unmap(mediator);
    }

    pub fn is_mediator_mapped<M: ?Sized>(&self, mediator: &Arc<M>) -> bool {
        self.mediators.contains(mediator)
    }

    /// Live registered mediators, in registration order
    pub fn mediators(&self) -> Vec<Arc<dyn Mediator>> {
        self.mediators.live()
    }

    /// Wrap `mediator` and register it
    pub fn create_mediator<M: Mediator>(&self, mediator: M) -> Arc<M> {
        let mediator = Arc::new(mediator);
        self.map_mediator(&mediator);
        mediator
    }

    /// Unregister then dispose
    pub fn dispose_mediator<M: ?Sized + Mediator>(&self, mediator: &Arc<M>) {
        self.unmap_mediator(mediator);
        mediator.dispose();
    }

    /// Open a message tap, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<Message>, SubscriberId) {
        let (tx, rx) = unbounded();

        let mut next_id = self.next_subscriber_id.write();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.subscribers.write().push(Subscriber { id, sender: tx });

        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
