//! Command pipeline
//!
//! Commands are requests to perform an action in response to a message.
//! A fresh command is built from the triggering message for every dispatch
//! and consumed by `exec`.

use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;

use super::message::Message;
use crate::error::HandlerResult;

/// A command class the kernel can map onto a message type
pub trait Command: Sized + 'static {
    /// Build the command for one triggering message
    fn from_message(msg: &Message) -> Self;

    /// Run the command
    fn exec(self) -> HandlerResult;
}

fn run_command<C: Command>(msg: &Message) -> HandlerResult {
    C::from_message(msg).exec()
}

/// A registered command class
#[derive(Clone, Copy)]
pub(crate) struct CommandEntry {
    id: TypeId,
    name: &'static str,
    run: fn(&Message) -> HandlerResult,
}

impl CommandEntry {
    fn of<C: Command>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
            run: run_command::<C>,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn run(&self, msg: &Message) -> HandlerResult {
        (self.run)(msg)
    }
}

/// Message type -> ordered set of command classes
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Vec<CommandEntry>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(HashMap::new()),
        }
    }

    /// Map `C` onto `kind`; mapping the same class twice is a no-op
    pub fn map<C: Command>(&self, kind: &str) {
        let entry = CommandEntry::of::<C>();
        let mut commands = self.commands.write();
        let list = commands.entry(kind.to_string()).or_default();
        if !list.iter().any(|c| c.id == entry.id) {
            list.push(entry);
        }
    }

    /// Remove `C` from `kind`; no-op when not mapped
    pub fn unmap<C: Command>(&self, kind: &str) {
        let id = TypeId::of::<C>();
        let mut commands = self.commands.write();
        if let Some(list) = commands.get_mut(kind) {
            if let Some(index) = list.iter().position(|c| c.id == id) {
                list.remove(index);
            }
            if list.is_empty() {
                commands.remove(kind);
            }
        }
    }

    pub fn is_mapped<C: Command>(&self, kind: &str) -> bool {
        let id = TypeId::of::<C>();
        self.commands
            .read()
            .get(kind)
            .is_some_and(|list| list.iter().any(|c| c.id == id))
    }

    /// Number of command classes mapped onto `kind`
    pub fn count(&self, kind: &str) -> usize {
        self.commands.read().get(kind).map_or(0, Vec::len)
    }

    /// Copy of the commands for `kind`, in mapping order
    pub(crate) fn snapshot(&self, kind: &str) -> Vec<CommandEntry> {
        self.commands.read().get(kind).cloned().unwrap_or_default()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Record {
        log: Option<Log>,
    }

    impl Command for Record {
        fn from_message(msg: &Message) -> Self {
            Self {
                log: msg.param::<Log>(0).cloned(),
            }
        }

        fn exec(self) -> HandlerResult {
            let log = self.log.ok_or_else(|| anyhow::anyhow!("missing log"))?;
            log.lock().push("record".to_string());
            Ok(())
        }
    }

    struct Noop;

    impl Command for Noop {
        fn from_message(_msg: &Message) -> Self {
            Noop
        }

        fn exec(self) -> HandlerResult {
            Ok(())
        }
    }

    #[test]
    fn test_map_has_set_semantics() {
        let registry = CommandRegistry::new();
        registry.map::<Record>("save");
        registry.map::<Record>("save");
        registry.map::<Noop>("save");

        assert_eq!(registry.count("save"), 2);
        let names: Vec<_> = registry.snapshot("save").iter().map(|c| c.name()).collect();
        assert!(names[0].ends_with("Record"));
        assert!(names[1].ends_with("Noop"));
    }

    #[test]
    fn test_unmap() {
        let registry = CommandRegistry::new();
        registry.map::<Record>("save");
        registry.unmap::<Noop>("save");
        assert!(registry.is_mapped::<Record>("save"));

        registry.unmap::<Record>("save");
        assert!(!registry.is_mapped::<Record>("save"));
        assert_eq!(registry.count("save"), 0);

        // Unknown type is a silent no-op
        registry.unmap::<Record>("load");
    }

    #[test]
    fn test_entry_builds_fresh_command() {
        let registry = CommandRegistry::new();
        registry.map::<Record>("save");
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let msg = Message::new("save").with_param(log.clone());

        for entry in registry.snapshot("save") {
            entry.run(&msg).unwrap();
            entry.run(&msg).unwrap();
        }
        assert_eq!(log.lock().len(), 2);
        assert!(registry.snapshot("save")[0]
            .run(&Message::new("save"))
            .is_err());
    }
}
