//! Chat platform transports.

pub mod discord;
pub mod discord_embeds;

pub use discord::{DiscordClient, DiscordSession};
