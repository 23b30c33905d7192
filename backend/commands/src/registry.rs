/// Command registry: name to handler, filled once at startup.
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::CommandHandler;
use crate::types::CommandDef;

pub struct RegisteredCommand {
    pub def: CommandDef,
    pub handler: Arc<dyn CommandHandler>,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, def: CommandDef, handler: Arc<dyn CommandHandler>) {
        let key = def.name.to_lowercase();
        if self.commands.contains_key(&key) {
            tracing::warn!("[Commands] Replacing handler for '{}'", key);
        }
        self.commands.insert(key, RegisteredCommand { def, handler });
    }

    /// Case-insensitive exact lookup.
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All definitions, sorted by name.
    pub fn defs(&self) -> Vec<CommandDef> {
        let mut defs: Vec<CommandDef> = self.commands.values().map(|c| c.def.clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
