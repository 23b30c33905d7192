//! Config defaults: fills every unset field after loading.

use crate::schema::{DevHelperConfig, HttpConfig, LoggingConfig, SupervisorConfig};

pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

pub const DEFAULT_RECONNECT_BASE_MS: u64 = 3_000;

pub const DEFAULT_RECONNECT_CAP_MS: u64 = 30_000;

pub const DEFAULT_ERROR_RECOVERY_DELAY_MS: u64 = 5_000;

/// Five minutes between liveness probes.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0";

pub const DEFAULT_HTTP_PORT: u16 = 4000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DevHelperConfig) -> DevHelperConfig {
    let config = apply_supervisor_defaults(config);
    let config = apply_http_defaults(config);
    apply_logging_defaults(config)
}

fn apply_supervisor_defaults(mut config: DevHelperConfig) -> DevHelperConfig {
    let s = config.supervisor.get_or_insert_with(SupervisorConfig::default);
    s.max_reconnect_attempts.get_or_insert(DEFAULT_MAX_RECONNECT_ATTEMPTS);
    s.reconnect_base_ms.get_or_insert(DEFAULT_RECONNECT_BASE_MS);
    s.reconnect_cap_ms.get_or_insert(DEFAULT_RECONNECT_CAP_MS);
    s.error_recovery_delay_ms.get_or_insert(DEFAULT_ERROR_RECOVERY_DELAY_MS);
    s.probe_interval_secs.get_or_insert(DEFAULT_PROBE_INTERVAL_SECS);
    config
}

fn apply_http_defaults(mut config: DevHelperConfig) -> DevHelperConfig {
    let http = config.http.get_or_insert_with(HttpConfig::default);
    if http.bind.as_deref().map(str::trim).unwrap_or("").is_empty() {
        http.bind = Some(DEFAULT_HTTP_BIND.to_string());
    }
    http.port.get_or_insert(DEFAULT_HTTP_PORT);
    config
}

fn apply_logging_defaults(mut config: DevHelperConfig) -> DevHelperConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_reconnect_defaults() {
        let cfg = apply_all_defaults(DevHelperConfig::default());
        let s = cfg.supervisor();
        assert_eq!(s.max_reconnect_attempts, Some(5));
        assert_eq!(s.reconnect_base_ms, Some(3_000));
        assert_eq!(s.reconnect_cap_ms, Some(30_000));
        assert_eq!(s.error_recovery_delay_ms, Some(5_000));
        assert_eq!(s.probe_interval_secs, Some(300));
    }

    #[test]
    fn fills_http_and_logging_defaults() {
        let cfg = apply_all_defaults(DevHelperConfig::default());
        assert_eq!(cfg.http().bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(cfg.http().port, Some(4000));
        assert_eq!(cfg.logging().level.as_deref(), Some("info"));
        assert_eq!(cfg.logging().dir.as_deref(), Some("logs"));
        assert_eq!(cfg.logging().json, Some(false));
    }

    #[test]
    fn keeps_user_values() {
        let cfg = DevHelperConfig {
            supervisor: Some(SupervisorConfig {
                max_reconnect_attempts: Some(2),
                ..Default::default()
            }),
            http: Some(HttpConfig { bind: None, port: Some(9000) }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.supervisor().max_reconnect_attempts, Some(2));
        assert_eq!(cfg.supervisor().reconnect_base_ms, Some(3_000));
        assert_eq!(cfg.http().port, Some(9000));
    }
}
