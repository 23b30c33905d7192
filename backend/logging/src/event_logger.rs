//! Bot State Event Logger
//!
//! Subscribes to state-change notifications and writes each transition as a
//! structured event under the `bot_state` target.

use chrono::{DateTime, Utc};
use devhelper_core::{BotState, StateChange};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateLogEntry {
    pub from: BotState,
    pub to: BotState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl From<StateChange> for StateLogEntry {
    fn from(change: StateChange) -> Self {
        Self {
            from: change.from,
            to: change.to,
            reason: redact_sensitive_data(&change.reason),
            at: change.at,
        }
    }
}

pub struct StateEventLogger;

impl StateEventLogger {
    pub fn log_change(change: StateChange) -> StateLogEntry {
        let entry = StateLogEntry::from(change);
        info!(
            target: "bot_state",
            from = %entry.from,
            to = %entry.to,
            reason = %entry.reason,
            at = %entry.at.to_rfc3339(),
            "Bot state changed"
        );
        entry
    }

    /// Log every change until the state machine is dropped.
    pub fn spawn(mut changes: broadcast::Receiver<StateChange>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        Self::log_change(change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "bot_state", skipped, "State log fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
