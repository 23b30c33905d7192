/// Command dispatch: route tokenized commands and button clicks to handlers.
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use devhelper_core::{ButtonClick, InboundMessage, ReplyPayload};
use futures::FutureExt;
use tracing::{debug, error, info};

use crate::detection::tokenize;
use crate::registry::CommandRegistry;
use crate::types::CommandDef;

// ---------------------------------------------------------------------------
// Handler traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command. `Ok(None)` means "nothing to send back".
    async fn execute(&self, args: &[String], message: &InboundMessage) -> Result<Option<ReplyPayload>>;
}

#[async_trait]
pub trait ButtonHandler: Send + Sync {
    async fn on_click(&self, click: &ButtonClick) -> Result<Option<ReplyPayload>>;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Owns the registry. Built mutable at startup, then shared behind an `Arc`
/// and only read.
#[derive(Default)]
pub struct CommandDispatcher {
    registry: CommandRegistry,
    buttons: HashMap<String, Arc<dyn ButtonHandler>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: CommandDef, handler: Arc<dyn CommandHandler>) {
        self.registry.register(def, handler);
    }

    /// Route clicks whose `custom_id` starts with `route:` to `handler`.
    pub fn register_button(&mut self, route: impl Into<String>, handler: Arc<dyn ButtonHandler>) {
        self.buttons.insert(route.into(), handler);
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Tokenize `text`, look the name up and run the handler.
    ///
    /// Unknown names, non-command text, handler errors and handler panics all
    /// come back as `None`; nothing propagates to the caller.
    pub async fn dispatch(&self, text: &str, message: &InboundMessage) -> Option<ReplyPayload> {
        let inv = tokenize(text)?;

        let Some(command) = self.registry.get(&inv.name) else {
            debug!("[Commands] No handler registered for '{}'", inv.name);
            return None;
        };

        info!(
            channel_id = %message.channel_id,
            sender_id = %message.sender_id,
            "[Commands] Dispatching /{} ({} args)",
            inv.name,
            inv.args.len()
        );

        let outcome = AssertUnwindSafe(command.handler.execute(&inv.args, message))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(error = %e, "[Commands] /{} failed", inv.name);
                None
            }
            Err(_) => {
                error!("[Commands] /{} panicked", inv.name);
                None
            }
        }
    }

    /// Route a button click by the segment before the first `:`.
    pub async fn dispatch_click(&self, click: &ButtonClick) -> Option<ReplyPayload> {
        let route = click.route();
        let Some(handler) = self.buttons.get(route) else {
            debug!("[Commands] No button handler for '{}'", click.custom_id);
            return None;
        };

        info!(channel_id = %click.channel_id, "[Commands] Button {}", click.custom_id);

        match AssertUnwindSafe(handler.on_click(click)).catch_unwind().await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(error = %e, "[Commands] Button {} failed", click.custom_id);
                None
            }
            Err(_) => {
                error!("[Commands] Button {} panicked", click.custom_id);
                None
            }
        }
    }
}
