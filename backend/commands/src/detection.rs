/// Command detection: split inbound text into a command name and arguments.
use devhelper_core::COMMAND_PREFIXES;

use crate::types::CommandInvocation;

/// Commands recognized even without a prefix.
pub const BARE_COMMANDS: [&str; 4] = ["active", "activate", "deactivate", "botstatus"];

/// True when the first non-whitespace character is a command prefix.
pub fn has_command_prefix(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| COMMAND_PREFIXES.contains(&c))
}

/// Tokenize a message into `(name, args)`.
///
/// Exactly one leading prefix is stripped. Unprefixed text only counts when
/// its first word is one of [`BARE_COMMANDS`]. Returns `None` for ordinary
/// chat and for a prefix with nothing after it.
pub fn tokenize(text: &str) -> Option<CommandInvocation> {
    let trimmed = text.trim_start();
    let first = trimmed.chars().next()?;

    let body = if COMMAND_PREFIXES.contains(&first) {
        &trimmed[first.len_utf8()..]
    } else if is_bare_command(trimmed) {
        trimmed
    } else {
        return None;
    };

    // split_whitespace also covers newlines, so multi-line input tokenizes
    // the same as its single-line form.
    let mut tokens = body.split_whitespace();
    let name = tokens.next()?.to_lowercase();
    let args = tokens.map(str::to_string).collect();

    Some(CommandInvocation { name, args })
}

/// Lower-cased command name of `text`, if it is a command at all.
pub fn command_name(text: &str) -> Option<String> {
    tokenize(text).map(|inv| inv.name)
}

fn is_bare_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|word| BARE_COMMANDS.contains(&word))
}
