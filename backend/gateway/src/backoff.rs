//! Reconnect policy: bounded exponential backoff shared by every recovery
//! trigger.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a recovery run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryTrigger {
    /// The platform reported the transport dropped.
    Disconnect,
    /// The platform client emitted an error event.
    ClientError,
    /// The periodic liveness probe found the session unhealthy.
    ProbeFailure,
}

impl std::fmt::Display for RecoveryTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RecoveryTrigger::Disconnect => "disconnect",
            RecoveryTrigger::ClientError => "client_error",
            RecoveryTrigger::ProbeFailure => "probe_failure",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPolicy {
    /// Attempts allowed before the supervisor gives up and waits for an operator.
    pub max_attempts: u32,
    /// First delay after a disconnect or failed probe; also the backoff base.
    pub base_delay_ms: u64,
    /// Upper bound for any single backoff delay.
    pub max_delay_ms: u64,
    /// First delay after a client error event.
    pub error_delay_ms: u64,
    /// How often the liveness probe runs.
    pub probe_interval_secs: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 3_000,
            max_delay_ms: 30_000,
            error_delay_ms: 5_000,
            probe_interval_secs: 300,
        }
    }
}

impl ReconnectPolicy {
    /// Wait before the first attempt of a recovery run.
    pub fn initial_delay(&self, trigger: RecoveryTrigger) -> Duration {
        match trigger {
            RecoveryTrigger::ClientError => Duration::from_millis(self.error_delay_ms),
            RecoveryTrigger::Disconnect | RecoveryTrigger::ProbeFailure => {
                Duration::from_millis(self.base_delay_ms)
            }
        }
    }

    /// Wait after failed attempt number `attempts` (1-indexed):
    /// `min(max_delay, base * 2^attempts)`.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempts);
        let delay_ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}
