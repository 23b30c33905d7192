use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::BotState;

/// Characters that mark a message as a command invocation.
pub const COMMAND_PREFIXES: [char; 3] = ['*', '/', '\\'];

/// Prefix advertised in help and status output.
pub const DEFAULT_COMMAND_PREFIX: &str = "*";

/// What the transport can tell us about the session without a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySummary {
    pub has_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub server_count: usize,
}

/// Read-only status snapshot returned by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub state: BotState,
    pub since: DateTime<Utc>,
    pub reason: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub connectivity: ConnectivitySummary,
    pub command_prefix: String,
    pub timestamp: DateTime<Utc>,
}
