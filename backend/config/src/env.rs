//! Environment handling for config values.
//!
//! - `${VAR_NAME}` in any string value is replaced at load time. Only
//!   uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes to a
//!   literal `${VAR}`.
//! - A handful of well-known variables override individual settings after
//!   the file is parsed.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::schema::{DevHelperConfig, DiscordConfig, HttpConfig, LoggingConfig};

/// `${VAR}` with an optional extra leading `$` marking an escape.
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").expect("valid env ref pattern"));

pub const TOKEN_ENV: &str = "DISCORD_TOKEN";
pub const PORT_ENV: &str = "DEVHELPER_PORT";
pub const BIND_ENV: &str = "DEVHELPER_BIND";
pub const LOG_ENV: &str = "RUST_LOG";

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references throughout a value tree.
///
/// Unset or empty variables are an error naming the config path.
pub fn resolve_env_vars(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute(value, env, "")?)
}

fn substitute(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                out.insert(key.clone(), substitute(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let replaced = ENV_REF.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Names of all variables referenced in a value tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.extend(
                ENV_REF
                    .captures_iter(s)
                    .filter(|c| c.get(1).is_none())
                    .map(|c| c[2].to_string()),
            ),
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut vars = Vec::new();
    walk(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

/// Apply the well-known environment overrides on top of the file config.
pub fn apply_env_overrides(mut config: DevHelperConfig, env: &HashMap<String, String>) -> DevHelperConfig {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(token) = get(TOKEN_ENV) {
        config.discord.get_or_insert_with(DiscordConfig::default).bot_token = Some(token.to_string());
    }

    if let Some(port) = get(PORT_ENV) {
        match port.parse::<u16>() {
            Ok(port) => config.http.get_or_insert_with(HttpConfig::default).port = Some(port),
            Err(_) => warn!(value = port, "Ignoring invalid {PORT_ENV}"),
        }
    }

    if let Some(bind) = get(BIND_ENV) {
        config.http.get_or_insert_with(HttpConfig::default).bind = Some(bind.to_string());
    }

    if let Some(level) = get(LOG_ENV) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.to_string());
    }

    config
}
