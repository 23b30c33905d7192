//! Connection state machine.
//!
//! Four states, all transitions legal, every transition stamps `since` and is
//! broadcast to subscribers. The supervisor is the only writer; the message
//! gate, command handlers and status endpoints read it.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const NOTIFY_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Active,
    Inactive,
    Reconnecting,
    Error,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Active => "active",
            BotState::Inactive => "inactive",
            BotState::Reconnecting => "reconnecting",
            BotState::Error => "error",
        }
    }

    /// Status light shown by the status commands.
    pub fn emoji(&self) -> &'static str {
        match self {
            BotState::Active => "🟢",
            BotState::Inactive => "🔴",
            BotState::Reconnecting => "🟡",
            BotState::Error => "🟠",
        }
    }
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: BotState,
    pub since: DateTime<Utc>,
    /// Empty unless the state is `Inactive` or `Error`.
    pub reason: String,
}

/// Published on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: BotState,
    pub to: BotState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

pub struct ConnectionStateMachine {
    current: RwLock<StateSnapshot>,
    notify: broadcast::Sender<StateChange>,
}

impl ConnectionStateMachine {
    /// Starts `Inactive` with an empty reason.
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_BUFFER);
        Self {
            current: RwLock::new(StateSnapshot {
                state: BotState::Inactive,
                since: Utc::now(),
                reason: String::new(),
            }),
            notify,
        }
    }

    pub fn set_active(&self) {
        self.transition(BotState::Active, String::new());
    }

    pub fn set_inactive(&self, reason: impl Into<String>) {
        self.transition(BotState::Inactive, reason.into());
    }

    pub fn set_reconnecting(&self) {
        self.transition(BotState::Reconnecting, String::new());
    }

    pub fn set_error(&self, reason: impl Into<String>) {
        self.transition(BotState::Error, reason.into());
    }

    pub fn state(&self) -> BotState {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub fn is_active(&self) -> bool {
        self.state() == BotState::Active
    }

    pub fn reason(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reason
            .clone()
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .since
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every subsequent transition. Lagging receivers lose the oldest.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.notify.subscribe()
    }

    fn transition(&self, to: BotState, reason: String) {
        let change = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let from = current.state;
            let at = Utc::now();
            *current = StateSnapshot {
                state: to,
                since: at,
                reason: reason.clone(),
            };
            StateChange { from, to, reason, at }
        };

        // Reason is logged, redacted, by the bot_state listener.
        debug!(from = %change.from, to = %change.to, "State transition");

        // No receivers is fine.
        let _ = self.notify.send(change);
    }
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
