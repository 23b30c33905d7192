/// Built-in command handlers.
///
/// Everything here talks to the bot only through `BotControl`, so chat and
/// the HTTP control surface share one set of semantics.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use devhelper_core::{
    ActionRow, BotControl, BotState, BotStatus, Button, ButtonClick, ButtonStyle, Embed,
    InboundMessage, ReplyPayload,
};
use tracing::info;

use crate::dispatch::{ButtonHandler, CommandHandler};
use crate::types::{CommandCategory, CommandDef};

pub const DEFAULT_DEACTIVATE_REASON: &str = "Deactivated manually";

const FOOTER: &str = "DevHelper Bot";

// ---------------------------------------------------------------------------
// Shared replies
// ---------------------------------------------------------------------------

/// Run `activate_bot` unless already active, and describe the outcome.
pub async fn activate_reply(control: &dyn BotControl) -> ReplyPayload {
    if control.is_active() {
        return ReplyPayload::text("✅ Bot is already active.");
    }
    if control.activate_bot().await {
        ReplyPayload::text("✅ Bot activated and ready for commands!")
    } else {
        let status = control.status().await;
        ReplyPayload::text(format!("❌ Activation failed: {}", status.reason))
    }
}

async fn deactivate_reply(control: &dyn BotControl, args: &[String]) -> ReplyPayload {
    if !control.is_active() {
        return ReplyPayload::text("❌ Bot is already inactive.");
    }
    let reason = if args.is_empty() {
        DEFAULT_DEACTIVATE_REASON.to_string()
    } else {
        args.join(" ")
    };
    control.deactivate_bot(&reason).await;
    ReplyPayload::text(format!(
        "🛑 Bot paused.\nReason: {reason}\n\nType *activate to enable it again."
    ))
}

fn format_since(status: &BotStatus) -> String {
    status.since.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Plain-text status block used by `botstatus`.
pub fn status_text(status: &BotStatus) -> String {
    let mut text = format!(
        "{} DevHelper Bot Status\nState: {}\nSince: {}\nPrefix: {}\nServers: {}\nReconnect attempts: {}/{}\n",
        status.state.emoji(),
        status.state,
        format_since(status),
        status.command_prefix,
        status.connectivity.server_count,
        status.attempts,
        status.max_attempts,
    );
    if status.state != BotState::Active {
        text.push_str(&format!("Reason: {}\n", status.reason));
    }
    text.push_str("\nUse *activate to enable or *deactivate to pause the bot.");
    text
}

fn status_embed(status: &BotStatus) -> Embed {
    let mut embed = Embed::new(format!("{} DevHelper Bot Status", status.state.emoji()))
        .field("State", status.state.as_str(), true)
        .field("Since", format_since(status), true)
        .field("Servers", status.connectivity.server_count.to_string(), true);
    if status.state != BotState::Active {
        let reason = if status.reason.is_empty() { "Unknown" } else { status.reason.as_str() };
        embed = embed.field("Reason", reason, false);
    }
    embed
        .field("Reconnect attempts", format!("{}/{}", status.attempts, status.max_attempts), true)
        .field("Command prefix", &status.command_prefix, true)
        .footer(format!("{FOOTER} - updated {}", status.timestamp.format("%H:%M:%S UTC")))
}

// ---------------------------------------------------------------------------
// /ping
// ---------------------------------------------------------------------------

pub struct PingHandler {
    pub control: Arc<dyn BotControl>,
}

#[async_trait]
impl CommandHandler for PingHandler {
    async fn execute(&self, _args: &[String], message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        info!("[Commands] Ping from {}", message.sender_id);
        let status = self.control.status().await;
        Ok(Some(ReplyPayload::text(format!(
            "🏓 Pong! Bot is online.\nConnected to {} server(s).",
            status.connectivity.server_count
        ))))
    }
}

// ---------------------------------------------------------------------------
// /active
// ---------------------------------------------------------------------------

pub struct ActiveHandler {
    pub control: Arc<dyn BotControl>,
}

#[async_trait]
impl CommandHandler for ActiveHandler {
    async fn execute(&self, _args: &[String], _message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        Ok(Some(activate_reply(self.control.as_ref()).await))
    }
}

// ---------------------------------------------------------------------------
// /deactivate
// ---------------------------------------------------------------------------

pub struct DeactivateHandler {
    pub control: Arc<dyn BotControl>,
}

#[async_trait]
impl CommandHandler for DeactivateHandler {
    async fn execute(&self, args: &[String], _message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        Ok(Some(deactivate_reply(self.control.as_ref(), args).await))
    }
}

// ---------------------------------------------------------------------------
// /botstatus
// ---------------------------------------------------------------------------

pub struct BotStatusHandler {
    pub control: Arc<dyn BotControl>,
}

#[async_trait]
impl CommandHandler for BotStatusHandler {
    async fn execute(&self, _args: &[String], _message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        let status = self.control.status().await;
        Ok(Some(ReplyPayload::text(status_text(&status))))
    }
}

// ---------------------------------------------------------------------------
// /bot <status|on|off|reset>
// ---------------------------------------------------------------------------

pub struct BotHandler {
    pub control: Arc<dyn BotControl>,
}

impl BotHandler {
    fn usage() -> ReplyPayload {
        ReplyPayload::text("🤖 Bot control commands:").with_embed(
            Embed::new("DevHelper - Bot Control")
                .description("Commands for managing the bot connection:")
                .field("/bot status", "Show the current bot state\nExample: `/bot status`", false)
                .field(
                    "/bot deactivate (or /bot off)",
                    "Pause the bot\nExample: `/bot off maintenance`",
                    false,
                )
                .field("/bot activate (or /bot on)", "Enable the bot again\nExample: `/bot on`", false)
                .field("/bot reset", "Reconnect from scratch\nExample: `/bot reset`", false)
                .footer(FOOTER),
        )
    }
}

#[async_trait]
impl CommandHandler for BotHandler {
    async fn execute(&self, args: &[String], _message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        let Some(sub) = args.first() else {
            return Ok(Some(Self::usage()));
        };

        let reply = match sub.to_lowercase().as_str() {
            "status" => {
                let status = self.control.status().await;
                ReplyPayload::default().with_embed(status_embed(&status))
            }
            "deactivate" | "off" => deactivate_reply(self.control.as_ref(), &args[1..]).await,
            "activate" | "on" => activate_reply(self.control.as_ref()).await,
            "reset" => {
                if self.control.reset_bot().await {
                    ReplyPayload::text("✅ Bot restarted successfully!")
                } else {
                    let status = self.control.status().await;
                    ReplyPayload::text(format!("❌ Restart failed: {}", status.reason))
                }
            }
            _ => Self::usage(),
        };
        Ok(Some(reply))
    }
}

// ---------------------------------------------------------------------------
// /help and its buttons
// ---------------------------------------------------------------------------

pub struct HelpHandler {
    pub commands: Vec<CommandDef>,
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, _args: &[String], _message: &InboundMessage) -> Result<Option<ReplyPayload>> {
        let mut embed = Embed::new("🤖 DevHelper Bot - Help")
            .description("Stores and searches saved commands, bugs and solutions for developers.");

        for category in [CommandCategory::Status, CommandCategory::Control, CommandCategory::Help] {
            let lines: Vec<String> = self
                .commands
                .iter()
                .filter(|c| c.category == category)
                .map(|c| format!("`{}` - {}", c.usage, c.description))
                .collect();
            if !lines.is_empty() {
                embed = embed.field(category_title(category), lines.join("\n"), false);
            }
        }

        let buttons = ActionRow::new(vec![
            Button::new(ButtonStyle::Primary, "Command guide", "help:command"),
            Button::new(ButtonStyle::Danger, "Bug guide", "help:bug"),
            Button::new(ButtonStyle::Success, "Solution guide", "help:solution"),
        ]);

        Ok(Some(
            ReplyPayload::default()
                .with_embed(embed.footer(format!("{FOOTER} v{}", env!("CARGO_PKG_VERSION"))))
                .with_row(buttons),
        ))
    }
}

fn category_title(category: CommandCategory) -> &'static str {
    match category {
        CommandCategory::Status => "📊 Status",
        CommandCategory::Control => "⚙️ Bot control",
        CommandCategory::Help => "❓ Help",
        CommandCategory::Custom => "📝 Commands",
    }
}

/// Answers the `help:*` buttons attached to the help reply.
pub struct HelpButtonHandler;

#[async_trait]
impl ButtonHandler for HelpButtonHandler {
    async fn on_click(&self, click: &ButtonClick) -> Result<Option<ReplyPayload>> {
        let embed = match click.action() {
            "command" => topic_embed(
                "📝 Command guide",
                "Save and look up shell commands:",
                &[
                    ("/command save", "Save a new command\nExample: `/command save --title=\"git-stash\" --command=\"git stash apply\" --category=\"git\"`"),
                    ("/command list", "List commands by category\nExample: `/command list --category=\"git\"`"),
                    ("/command detail", "Show one command\nExample: `/command detail --id=125`"),
                    ("/command find", "Search by keyword\nExample: `/command find --query=\"git stash\"`"),
                    ("/command update", "Edit a command\nExample: `/command update --id=125 --desc=\"New description\"`"),
                    ("/command delete", "Delete a command\nExample: `/command delete --id=125`"),
                    ("/command restore", "Restore a deleted command\nExample: `/command restore --id=125`"),
                ],
            ),
            "bug" => topic_embed(
                "🐛 Bug guide",
                "Report and track bugs:",
                &[
                    ("/bug create", "Report a bug\nExample: `/bug create --title=\"JWT not refreshed\" --severity=\"high\"`"),
                    ("/bug list", "List bugs by status\nExample: `/bug list --status=\"open\"`"),
                    ("/bug detail", "Show one bug\nExample: `/bug detail --id=47`"),
                    ("/bug update", "Update a bug\nExample: `/bug update --id=47 --status=\"in_progress\"`"),
                ],
            ),
            "solution" => topic_embed(
                "💡 Solution guide",
                "Attach fixes to bugs:",
                &[
                    ("/solution create", "Add a solution to a bug\nExample: `/solution create --bug-id=47 --title=\"Fix token refresh\"`"),
                    ("/solution list", "List solutions for a bug\nExample: `/solution list --bug-id=47`"),
                    ("/solution detail", "Show one solution\nExample: `/solution detail --id=28`"),
                    ("/solution update", "Update a solution\nExample: `/solution update --id=28 --desc=\"New description\"`"),
                ],
            ),
            _ => {
                return Ok(Some(ReplyPayload::text(
                    "Pick a specific guide (command, bug or solution).",
                )));
            }
        };
        Ok(Some(ReplyPayload::default().with_embed(embed)))
    }
}

fn topic_embed(title: &str, description: &str, entries: &[(&str, &str)]) -> Embed {
    entries
        .iter()
        .fold(Embed::new(title).description(description), |embed, (name, value)| {
            embed.field(format!("`{name}`"), *value, false)
        })
}

/// Definitions of every built-in, in registration order.
pub fn builtin_defs() -> Vec<CommandDef> {
    vec![
        CommandDef::new("ping", "Check that the bot responds", "*ping", CommandCategory::Status),
        CommandDef::new("botstatus", "Show connection state", "*botstatus", CommandCategory::Status),
        CommandDef::new("active", "Enable the bot", "*active", CommandCategory::Control),
        CommandDef::new("deactivate", "Pause the bot", "*deactivate [reason]", CommandCategory::Control),
        CommandDef::new("bot", "Bot control (status/on/off/reset)", "/bot <status|on|off|reset>", CommandCategory::Control),
        CommandDef::new("help", "Show this help", "*help", CommandCategory::Help),
    ]
}
