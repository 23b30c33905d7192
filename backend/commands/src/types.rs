/// Command types.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Status,
    Control,
    Help,
    Custom,
}

// ---------------------------------------------------------------------------
// Command definition
// ---------------------------------------------------------------------------

/// Registry metadata for one command name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    /// Lowercase lookup key (e.g. "botstatus").
    pub name: String,
    pub description: String,
    /// Example invocation shown in help (e.g. "*bot off maintenance").
    pub usage: String,
    pub category: CommandCategory,
}

impl CommandDef {
    pub fn new(name: &str, description: &str, usage: &str, category: CommandCategory) -> Self {
        Self {
            name: name.to_lowercase(),
            description: description.to_string(),
            usage: usage.to_string(),
            category,
        }
    }

    /// Minimal definition for commands registered by name only.
    pub fn named(name: &str) -> Self {
        Self::new(name, "", "", CommandCategory::Custom)
    }
}

// ---------------------------------------------------------------------------
// Parsed invocation
// ---------------------------------------------------------------------------

/// A tokenized command: lower-cased name plus positional argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub args: Vec<String>,
}
