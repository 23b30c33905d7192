//! `devhelper-config`: runtime configuration for the DevHelper bot.
//!
//! Provides:
//! - Typed config schema (Discord credentials, supervisor tuning, HTTP, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation with path-qualified errors
//! - Redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, collect_referenced_vars, process_env, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_raw};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{DevHelperConfig, DiscordConfig, HttpConfig, LoggingConfig, SupervisorConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Warnings
/// are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<DevHelperConfig> {
    let raw = load_raw(path).await?;
    prepare(raw, &process_env())
}

/// The pure half of [`load_and_prepare`], with an explicit environment.
pub fn prepare(raw: Value, env: &HashMap<String, String>) -> Result<DevHelperConfig> {
    let value = resolve_env_vars(&raw, env).context("Failed to resolve env vars in config")?;

    let config: DevHelperConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        let details: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    Ok(config)
}

/// Logging settings alone, resolved leniently so the logger can start
/// before the full config is validated.
pub fn logging_settings(raw: &Value, env: &HashMap<String, String>) -> LoggingConfig {
    let logging = raw
        .get("logging")
        .cloned()
        .and_then(|v| serde_json::from_value::<LoggingConfig>(v).ok());
    let config = DevHelperConfig { logging, ..Default::default() };
    apply_all_defaults(apply_env_overrides(config, env)).logging()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn token_from_env_reference() {
        let raw = json!({"discord": {"botToken": "${BOT_SECRET}"}});
        let cfg = prepare(raw, &env(&[("BOT_SECRET", "abc")])).unwrap();
        assert_eq!(cfg.bot_token(), Some("abc"));
        assert_eq!(cfg.http().port, Some(4000));
    }

    #[test]
    fn token_from_override_only() {
        let cfg = prepare(json!({}), &env(&[("DISCORD_TOKEN", "xyz")])).unwrap();
        assert_eq!(cfg.bot_token(), Some("xyz"));
    }

    #[test]
    fn missing_token_fails() {
        let err = prepare(json!({}), &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("discord.botToken"));
    }

    #[test]
    fn logging_settings_survive_invalid_config() {
        let raw = json!({"logging": {"dir": "/var/log/devhelper"}, "http": {"port": "bad"}});
        let logging = logging_settings(&raw, &env(&[("RUST_LOG", "debug")]));
        assert_eq!(logging.dir.as_deref(), Some("/var/log/devhelper"));
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.json, Some(false));
    }

    #[test]
    fn unknown_shape_fails_deserialization() {
        let raw = json!({"http": {"port": "not-a-port"}});
        assert!(prepare(raw, &env(&[("DISCORD_TOKEN", "t")])).is_err());
    }
}
