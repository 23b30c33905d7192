use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BotError;
use crate::event::PlatformEvent;
use crate::message::{ChannelRef, ReplyPayload};
use crate::types::{BotStatus, ConnectivitySummary};

/// Anything that can deliver a reply to a channel.
///
/// One implementation per transport; callers never probe for methods.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, channel: &ChannelRef, payload: ReplyPayload) -> Result<(), BotError>;
}

/// A live, authenticated session with the chat platform.
///
/// Handles are never mutated in place: reconnecting means shutting one down
/// and logging in again to get a fresh one.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Whether the session is still authenticated. `Ok(false)` and `Err` are
    /// both treated as unhealthy.
    async fn probe(&self) -> Result<bool, BotError>;

    /// Best-effort teardown; must not fail.
    async fn shutdown(&self);

    async fn send_reply(&self, channel: &ChannelRef, payload: ReplyPayload) -> Result<(), BotError>;

    fn connectivity(&self) -> ConnectivitySummary;
}

/// Factory for connection handles, holding the credentials.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Open a new session. The handle reports its events on `events` until
    /// it is shut down.
    async fn login(
        &self,
        events: mpsc::Sender<PlatformEvent>,
    ) -> Result<Arc<dyn ConnectionHandle>, BotError>;
}

/// The administrative surface of the bot, shared by chat commands and the
/// HTTP control endpoints so both observe identical semantics.
#[async_trait]
pub trait BotControl: Send + Sync {
    async fn activate_bot(&self) -> bool;

    async fn deactivate_bot(&self, reason: &str) -> bool;

    async fn reset_bot(&self) -> bool;

    async fn status(&self) -> BotStatus;

    /// Live probe of the current connection; false when there is none.
    async fn check_connection(&self) -> bool;

    fn is_active(&self) -> bool;
}
