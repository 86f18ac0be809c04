//! Handler types shared by the bus, the injection registry and the
//! mediator registry, plus the fault barrier every handler call runs behind.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::message::Message;
use crate::error::HandlerResult;

type ListenerFn = dyn Fn(&Message) -> HandlerResult + Send + Sync;

/// An explicit message listener.
///
/// Identity is the shared closure: clones of one `Listener` are the same
/// listener, two separately built listeners never are, even over the same
/// function. Context a handler needs is captured by the closure.
#[derive(Clone)]
pub struct Listener {
    handler: Arc<ListenerFn>,
}

impl Listener {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Message) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Whether both handles refer to the same listener
    pub fn same_as(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.handler), Arc::as_ptr(&other.handler))
    }

    pub fn call(&self, msg: &Message) -> HandlerResult {
        (self.handler)(msg)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("handler", &Arc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

type SugarFn<T> = dyn Fn(&T, &Message) -> HandlerResult + Send + Sync;

/// Message-sugar table: at most one handler per message type, invoked with
/// the owning object.
///
/// ```rust,ignore
/// impl Injectable for ScoreModel {
///     fn message_handlers() -> MessageHandlers<Self> {
///         MessageHandlers::new().on("goal", |model: &ScoreModel, _msg| {
///             model.bump();
///             Ok(())
///         })
///     }
/// }
/// ```
pub struct MessageHandlers<T: ?Sized> {
    table: HashMap<String, Arc<SugarFn<T>>>,
}

impl<T: ?Sized> MessageHandlers<T> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Register the handler for `kind`, replacing any previous one
    pub fn on<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&T, &Message) -> HandlerResult + Send + Sync + 'static,
    {
        self.table.insert(kind.into(), Arc::new(handler));
        self
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.table.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Run the handler for `msg` against `target`; `None` when unhandled
    pub fn handle(&self, target: &T, msg: &Message) -> Option<HandlerResult> {
        self.table
            .get(msg.kind())
            .map(|handler| handler(target, msg))
    }
}

impl<T: ?Sized> Default for MessageHandlers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for MessageHandlers<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

/// Type-erased sugar entry: the target is already bound
pub(crate) type BoundSugar = Arc<dyn Fn(&Message) -> Option<HandlerResult> + Send + Sync>;

/// Delivery stage a handler runs in, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Inject,
    Mediator,
    Command,
    Listener,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Inject => "inject",
            Stage::Mediator => "mediator",
            Stage::Command => "command",
            Stage::Listener => "listener",
        }
    }
}

/// Run one handler so that neither an `Err` nor a panic escapes.
///
/// Returns `false` when the handler faulted.
pub(crate) fn isolate<F>(stage: Stage, kind: &str, target: &str, handler: F) -> bool
where
    F: FnOnce() -> HandlerResult,
{
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::error!(
                "[core] {} handler {} for '{}' failed: {:#}",
                stage.as_str(),
                target,
                kind,
                err
            );
            false
        }
        Err(panic) => {
            tracing::error!(
                "[core] {} handler {} for '{}' panicked: {}",
                stage.as_str(),
                target,
                kind,
                panic_message(panic.as_ref())
            );
            false
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
