//! Message gate: decides what happens to each inbound chat message before
//! it reaches the command dispatcher.
//!
//! Checks run in a fixed order. Edited messages never reach anything, the
//! activate command always works with or without a prefix, unprefixed text
//! stops there, and the two admin commands that must stay usable while the
//! bot is inactive bypass the activity check.

use devhelper_commands::{command_name, has_command_prefix};
use devhelper_core::InboundMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Edits are ignored so re-saving a message never re-runs a command.
    DropEdited,
    /// `activate`: bring the bot up, confirm, then dispatch.
    Activate,
    /// No command prefix, or a prefix with nothing after it.
    DropNotCommand,
    /// `deactivate` / `botstatus`: dispatched regardless of state.
    Admin,
    /// Ordinary command while active.
    Forward,
    /// Ordinary command while inactive.
    DropInactive,
}

impl GateDecision {
    pub fn dispatches(self) -> bool {
        matches!(self, GateDecision::Activate | GateDecision::Admin | GateDecision::Forward)
    }
}

pub fn evaluate(message: &InboundMessage, is_active: bool) -> GateDecision {
    if message.is_edited {
        return GateDecision::DropEdited;
    }

    let name = command_name(&message.text);

    if name.as_deref() == Some("activate") {
        return GateDecision::Activate;
    }

    if !has_command_prefix(&message.text) {
        return GateDecision::DropNotCommand;
    }
    let Some(name) = name else {
        return GateDecision::DropNotCommand;
    };

    if matches!(name.as_str(), "deactivate" | "botstatus") {
        return GateDecision::Admin;
    }

    if is_active {
        GateDecision::Forward
    } else {
        GateDecision::DropInactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new("c1", text)
    }

    fn edited(text: &str) -> InboundMessage {
        InboundMessage { is_edited: true, ..msg(text) }
    }

    #[test]
    fn edits_are_dropped_first() {
        assert_eq!(evaluate(&edited("*activate"), false), GateDecision::DropEdited);
        assert_eq!(evaluate(&edited("*ping"), true), GateDecision::DropEdited);
    }

    #[test]
    fn activate_passes_in_any_state() {
        for active in [true, false] {
            assert_eq!(evaluate(&msg("*activate"), active), GateDecision::Activate);
            assert_eq!(evaluate(&msg("activate"), active), GateDecision::Activate);
            assert_eq!(evaluate(&msg("  activate now"), active), GateDecision::Activate);
        }
    }

    #[test]
    fn active_is_an_ordinary_command() {
        assert_eq!(evaluate(&msg("*active"), false), GateDecision::DropInactive);
        assert_eq!(evaluate(&msg("/active"), true), GateDecision::Forward);
        assert_eq!(evaluate(&msg("active"), true), GateDecision::DropNotCommand);
    }

    #[test]
    fn plain_chatter_is_dropped() {
        assert_eq!(evaluate(&msg("hello there"), true), GateDecision::DropNotCommand);
        assert_eq!(evaluate(&msg(""), true), GateDecision::DropNotCommand);
        assert_eq!(evaluate(&msg("ping"), true), GateDecision::DropNotCommand);
        assert_eq!(evaluate(&msg("*"), true), GateDecision::DropNotCommand);
    }

    #[test]
    fn unprefixed_admin_words_are_chatter() {
        for active in [true, false] {
            assert_eq!(evaluate(&msg("botstatus"), active), GateDecision::DropNotCommand);
            assert_eq!(evaluate(&msg("deactivate lunch"), active), GateDecision::DropNotCommand);
        }
    }

    #[test]
    fn admin_commands_bypass_inactivity() {
        assert_eq!(evaluate(&msg("*deactivate maintenance"), false), GateDecision::Admin);
        assert_eq!(evaluate(&msg("/botstatus"), false), GateDecision::Admin);
        assert_eq!(evaluate(&msg("\\botstatus"), true), GateDecision::Admin);
    }

    #[test]
    fn ordinary_commands_follow_state() {
        assert_eq!(evaluate(&msg("*ping"), true), GateDecision::Forward);
        assert_eq!(evaluate(&msg("*ping"), false), GateDecision::DropInactive);
        assert!(!GateDecision::DropInactive.dispatches());
        assert!(GateDecision::Forward.dispatches());
    }
}
