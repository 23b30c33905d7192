//! Discord Message Builder
//!
//! Maps transport-neutral [`ReplyPayload`]s onto serenity message builders.

use devhelper_core::{ActionRow, Button, ButtonStyle, Embed, ReplyPayload};
use serenity::all::{
    ButtonStyle as DiscordButtonStyle, CreateActionRow, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateMessage,
};

/// Discord rejects message content longer than this.
pub const MAX_CONTENT_CHARS: usize = 2000;

const BRAND_COLOR: u32 = 0x5865F2;

pub fn build_message(payload: &ReplyPayload) -> CreateMessage {
    let mut message = CreateMessage::new();

    if !payload.text.is_empty() {
        message = message.content(clamp_content(&payload.text));
    }
    for embed in &payload.embeds {
        message = message.embed(build_embed(embed));
    }
    if !payload.components.is_empty() {
        message = message.components(payload.components.iter().map(build_row).collect());
    }

    message
}

pub fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut out = CreateEmbed::new().title(&embed.title).color(BRAND_COLOR);
    if let Some(description) = &embed.description {
        out = out.description(description);
    }
    for field in &embed.fields {
        out = out.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        out = out.footer(CreateEmbedFooter::new(footer));
    }
    out
}

fn build_row(row: &ActionRow) -> CreateActionRow {
    CreateActionRow::Buttons(row.buttons.iter().map(build_button).collect())
}

fn build_button(button: &Button) -> CreateButton {
    CreateButton::new(&button.custom_id)
        .label(&button.label)
        .style(button_style(button.style))
}

pub fn button_style(style: ButtonStyle) -> DiscordButtonStyle {
    match style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    }
}

/// Truncate to the platform limit on a char boundary, marking the cut.
pub fn clamp_content(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_CONTENT_CHARS - 1).collect();
    out.push('…');
    out
}
