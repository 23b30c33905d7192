use thiserror::Error;

/// Top-level error type for the bot runtime.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("login failed: {0}")]
    Login(String),

    #[error("connection probe failed: {0}")]
    Probe(String),

    #[error("no live connection")]
    NotConnected,

    #[error("reply delivery to channel {channel_id} failed: {message}")]
    Delivery { channel_id: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
