pub mod error;
pub mod event;
pub mod message;
pub mod state;
pub mod traits;
pub mod types;

pub use error::BotError;
pub use event::PlatformEvent;
pub use message::{
    ActionRow, Button, ButtonClick, ButtonStyle, ChannelRef, Embed, EmbedField, InboundMessage,
    ReplyPayload,
};
pub use state::{BotState, ConnectionStateMachine, StateChange, StateSnapshot};
pub use traits::{BotControl, ConnectionHandle, PlatformClient, ReplySink};
pub use types::{BotStatus, ConnectivitySummary, COMMAND_PREFIXES, DEFAULT_COMMAND_PREFIX};
