//! Config validation with path-qualified errors and warnings.

use crate::schema::DevHelperConfig;
use thiserror::Error;

/// Probe intervals below this are allowed but flagged.
pub const MIN_SENSIBLE_PROBE_SECS: u64 = 30;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a config after defaults have been applied.
pub fn validate(config: &DevHelperConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_discord(config, &mut report);
    validate_supervisor(config, &mut report);
    validate_http(config, &mut report);
    report
}

fn validate_discord(config: &DevHelperConfig, report: &mut ValidationReport) {
    if config.bot_token().map(str::trim).unwrap_or("").is_empty() {
        report.error(
            "discord.botToken",
            "Discord bot token is required (set it in config or via DISCORD_TOKEN)",
        );
    }
}

fn validate_supervisor(config: &DevHelperConfig, report: &mut ValidationReport) {
    let s = config.supervisor();

    if s.max_reconnect_attempts == Some(0) {
        report.error("supervisor.maxReconnectAttempts", "maxReconnectAttempts must be >= 1");
    }
    if s.reconnect_base_ms == Some(0) {
        report.error("supervisor.reconnectBaseMs", "reconnectBaseMs must be > 0");
    }
    if let (Some(base), Some(cap)) = (s.reconnect_base_ms, s.reconnect_cap_ms) {
        if cap < base {
            report.error(
                "supervisor.reconnectCapMs",
                format!("reconnectCapMs ({cap}) must not be below reconnectBaseMs ({base})"),
            );
        }
    }
    match s.probe_interval_secs {
        Some(0) => report.error("supervisor.probeIntervalSecs", "probeIntervalSecs must be > 0"),
        Some(secs) if secs < MIN_SENSIBLE_PROBE_SECS => report.warn(
            "supervisor.probeIntervalSecs",
            format!("Probing every {secs}s may hit platform rate limits"),
        ),
        _ => {}
    }
}

fn validate_http(config: &DevHelperConfig, report: &mut ValidationReport) {
    let http = config.http();
    if let Some(port) = http.port {
        if port == 0 {
            report.error("http.port", "port must be > 0");
        } else if port < 1024 {
            report.warn(
                "http.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if let Some(bind) = &http.bind {
        if bind.parse::<std::net::IpAddr>().is_err() {
            report.error("http.bind", format!("'{bind}' is not an IP address"));
        }
    }
}
