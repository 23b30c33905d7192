//! DevHelper configuration schema.
//!
//! Every field is optional on disk; [`crate::defaults`] fills the gaps after
//! loading so the rest of the program can read resolved values.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevHelperConfig {
    /// Discord credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordConfig>,

    /// Reconnect and liveness-probe tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<SupervisorConfig>,

    /// Admin HTTP server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reconnect_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_base_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_cap_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_recovery_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `devhelper_gateway=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Emit JSON lines on the console instead of human-readable output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl DevHelperConfig {
    pub fn bot_token(&self) -> Option<&str> {
        self.discord.as_ref()?.bot_token.as_deref()
    }

    pub fn supervisor(&self) -> SupervisorConfig {
        self.supervisor.clone().unwrap_or_default()
    }

    pub fn http(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
discord:
  botToken: abc
supervisor:
  maxReconnectAttempts: 7
  probeIntervalSecs: 60
http:
  port: 8080
"#;
        let cfg: DevHelperConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.bot_token(), Some("abc"));
        assert_eq!(cfg.supervisor().max_reconnect_attempts, Some(7));
        assert_eq!(cfg.supervisor().probe_interval_secs, Some(60));
        assert_eq!(cfg.http().port, Some(8080));
        assert!(cfg.logging.is_none());
    }

    #[test]
    fn empty_document_is_default() {
        let cfg: DevHelperConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, DevHelperConfig::default());
    }
}
