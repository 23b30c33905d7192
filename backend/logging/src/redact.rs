//! Log Redaction
//!
//! Scrubs bot tokens and authorization headers from free-form text (mostly
//! platform error messages) before it is logged.

use regex::Regex;
use std::sync::LazyLock;

/// Three dot-separated base64url segments, the shape of a Discord bot token.
static DISCORD_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_-]{20,}\.[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{20,}").expect("valid token pattern")
});
static AUTH_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Bot|Bearer)\s+[A-Za-z0-9\-._~+/]{20,}=*").expect("valid header pattern")
});

pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = AUTH_HEADER_RE.replace_all(input, "$1 [REDACTED_TOKEN]");
    DISCORD_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}
