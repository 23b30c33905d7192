use crate::message::{ButtonClick, InboundMessage};

/// Everything a live platform session can report to the supervisor.
///
/// Each connection handle is given its own sender at login; the supervisor
/// drains one receiver per handle generation, so events from a replaced
/// handle never reach the new one's pump.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// The session finished authenticating (or resumed).
    Connected,
    /// The underlying transport dropped.
    Disconnected,
    /// The client reported an error it could not handle itself.
    Error(String),
    /// A chat message arrived (or an existing one was edited).
    Message(InboundMessage),
    /// A user pressed an interactive button on one of our replies.
    ButtonClick(ButtonClick),
}

impl PlatformEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformEvent::Connected => "connected",
            PlatformEvent::Disconnected => "disconnected",
            PlatformEvent::Error(_) => "error",
            PlatformEvent::Message(_) => "message",
            PlatformEvent::ButtonClick(_) => "button_click",
        }
    }
}

impl std::fmt::Display for PlatformEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}
