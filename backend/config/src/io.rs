//! Config file location and loading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

pub const CONFIG_DIR_ENV: &str = "DEVHELPER_CONFIG_DIR";

/// Resolve the config directory.
/// Priority: `DEVHELPER_CONFIG_DIR` env > `~/.devhelper/` > `./.devhelper`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".devhelper"),
        None => PathBuf::from(".devhelper"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the YAML file as an untyped value tree.
///
/// A missing file is an empty mapping (first run); an empty file likewise.
pub async fn load_raw(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("devhelper-config-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn missing_file_is_empty_mapping() {
        let path = scratch("missing").join("nope.yaml");
        let value = load_raw(&path).await.unwrap();
        assert_eq!(value, Value::Object(Default::default()));
    }

    #[tokio::test]
    async fn reads_yaml_into_value() {
        let path = config_file_path(&scratch("read"));
        std::fs::write(&path, "http:\n  port: 5000\n").unwrap();
        let value = load_raw(&path).await.unwrap();
        assert_eq!(value["http"]["port"], 5000);
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let path = config_file_path(&scratch("bad"));
        std::fs::write(&path, "http: [unclosed\n").unwrap();
        let err = load_raw(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
