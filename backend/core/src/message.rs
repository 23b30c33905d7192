use serde::{Deserialize, Serialize};

/// A chat message as delivered by the platform transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub server_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub sender_id: String,
    pub text: String,
    /// Set when the platform re-delivers a message because it was edited.
    pub is_edited: bool,
}

impl InboundMessage {
    pub fn new(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            server_id: String::new(),
            channel_id: channel_id.into(),
            message_id: String::new(),
            sender_id: String::new(),
            text: text.into(),
            is_edited: false,
        }
    }

    /// Where replies to this message should go.
    pub fn channel(&self) -> ChannelRef {
        ChannelRef {
            server_id: self.server_id.clone(),
            channel_id: self.channel_id.clone(),
        }
    }
}

/// A button press on an interactive component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonClick {
    pub server_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub sender_id: String,
    /// Component identifier, conventionally `route:action` (e.g. `help:bug`).
    pub custom_id: String,
}

impl ButtonClick {
    pub fn channel(&self) -> ChannelRef {
        ChannelRef {
            server_id: self.server_id.clone(),
            channel_id: self.channel_id.clone(),
        }
    }

    /// The segment before the first `:`, used to pick a button handler.
    pub fn route(&self) -> &str {
        self.custom_id
            .split_once(':')
            .map(|(route, _)| route)
            .unwrap_or(&self.custom_id)
    }

    /// The segment after the first `:`, empty when there is none.
    pub fn action(&self) -> &str {
        self.custom_id
            .split_once(':')
            .map(|(_, action)| action)
            .unwrap_or("")
    }
}

/// Addressing for a reply: server (guild/clan) plus channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub server_id: String,
    pub channel_id: String,
}

// ---------------------------------------------------------------------------
// Reply payloads
// ---------------------------------------------------------------------------

/// A transport-neutral reply: text plus optional embeds and button rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl ReplyPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

impl ActionRow {
    pub fn new(buttons: Vec<Button>) -> Self {
        Self { buttons }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub custom_id: String,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            custom_id: custom_id.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(custom_id: &str) -> ButtonClick {
        ButtonClick {
            server_id: "s".into(),
            channel_id: "c".into(),
            message_id: "m".into(),
            sender_id: "u".into(),
            custom_id: custom_id.into(),
        }
    }

    #[test]
    fn button_route_splits_on_first_colon() {
        let c = click("help:bug:extra");
        assert_eq!(c.route(), "help");
        assert_eq!(c.action(), "bug:extra");
    }

    #[test]
    fn button_without_colon_routes_on_whole_id() {
        let c = click("refresh");
        assert_eq!(c.route(), "refresh");
        assert_eq!(c.action(), "");
    }

    #[test]
    fn reply_payload_omits_empty_collections() {
        let json = serde_json::to_value(ReplyPayload::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hi" }));
    }
}
