//! Config redaction: mask secrets before a config is logged or displayed.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "botToken",
    "bot_token",
    "token",
    "apiKey",
    "api_key",
    "secret",
    "password",
];

/// Replace every sensitive string with a short hint plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn mask(s: &str) -> String {
    // Short secrets reveal nothing at all.
    if s.chars().count() <= 8 {
        return "***".to_string();
    }
    format!("{}***", s.chars().take(4).collect::<String>())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => Value::String(mask(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Dotted paths of every field [`redact`] would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    fn walk(value: &Value, path: &str, key: &str, out: &mut Vec<String>) {
        match value {
            Value::String(s) if is_sensitive_key(key) && !s.is_empty() => out.push(path.to_string()),
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    walk(v, &format!("{path}[{i}]"), key, out);
                }
            }
            Value::Object(map) => {
                for (k, v) in map {
                    let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                    walk(v, &child, k, out);
                }
            }
            _ => {}
        }
    }

    let mut paths = Vec::new();
    walk(value, "", "", &mut paths);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_bot_token() {
        let v = json!({"discord": {"botToken": "MTIzNDU2Nzg5.abc.def"}});
        let out = redact(&v);
        let token = out["discord"]["botToken"].as_str().unwrap();
        assert_eq!(token, "MTIz***");
    }

    #[test]
    fn short_secret_fully_hidden() {
        let out = redact(&json!({"token": "abc"}));
        assert_eq!(out["token"], "***");
    }

    #[test]
    fn leaves_other_fields() {
        let v = json!({"http": {"port": 4000, "bind": "0.0.0.0"}, "logging": {"level": "debug"}});
        assert_eq!(redact(&v), v);
    }

    #[test]
    fn lists_redacted_paths() {
        let v = json!({"discord": {"botToken": "secret-value"}, "http": {"port": 1}});
        assert_eq!(collect_redacted_paths(&v), vec!["discord.botToken".to_string()]);
    }
}
