//! Discord transport on serenity.
//!
//! [`DiscordClient`] holds the bot token and logs in; each login yields a
//! [`DiscordSession`] that owns its own serenity client task and reports
//! gateway events on the channel it was given.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use devhelper_core::{
    BotError, ButtonClick, ChannelRef, ConnectionHandle, ConnectivitySummary, InboundMessage,
    PlatformClient, PlatformEvent, ReplyPayload,
};
use serenity::all::{
    ChannelId, Client, ComponentInteraction, ConnectionStage, Context, CreateInteractionResponse,
    EventHandler, GatewayIntents, Http, Interaction, Message as DiscordMessage, MessageUpdateEvent,
    Ready, ResumedEvent, ShardManager, ShardStageUpdateEvent,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::discord_embeds::build_message;

type SharedSummary = Arc<RwLock<ConnectivitySummary>>;

struct Handler {
    events: mpsc::Sender<PlatformEvent>,
    summary: SharedSummary,
}

impl Handler {
    async fn emit(&self, event: PlatformEvent) {
        if self.events.send(event).await.is_err() {
            debug!("[Discord] Event receiver gone, dropping event");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "[Discord] Connected");
        {
            let mut summary = self.summary.write().unwrap_or_else(PoisonError::into_inner);
            summary.has_user = true;
            summary.user_id = Some(ready.user.id.to_string());
            summary.user_name = Some(ready.user.name.clone());
            summary.server_count = ready.guilds.len();
        }
        self.emit(PlatformEvent::Connected).await;
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        info!("[Discord] Session resumed");
        self.emit(PlatformEvent::Connected).await;
    }

    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        debug!(shard = ?event.shard_id, from = ?event.old, to = ?event.new, "[Discord] Shard stage");
        if event.new == ConnectionStage::Disconnected {
            warn!(shard = ?event.shard_id, "[Discord] Shard disconnected");
            self.emit(PlatformEvent::Disconnected).await;
        }
    }

    async fn message(&self, _ctx: Context, msg: DiscordMessage) {
        if msg.author.bot {
            return;
        }
        debug!(channel_id = %msg.channel_id, message_id = %msg.id, "[Discord] Message");
        self.emit(PlatformEvent::Message(InboundMessage {
            server_id: msg.guild_id.map(|g| g.to_string()).unwrap_or_default(),
            channel_id: msg.channel_id.to_string(),
            message_id: msg.id.to_string(),
            sender_id: msg.author.id.to_string(),
            text: msg.content,
            is_edited: false,
        }))
        .await;
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old: Option<DiscordMessage>,
        _new: Option<DiscordMessage>,
        event: MessageUpdateEvent,
    ) {
        // Embed unfurls arrive as updates without content.
        let Some(text) = event.content else { return };
        if event.author.as_ref().is_some_and(|a| a.bot) {
            return;
        }
        self.emit(PlatformEvent::Message(InboundMessage {
            server_id: event.guild_id.map(|g| g.to_string()).unwrap_or_default(),
            channel_id: event.channel_id.to_string(),
            message_id: event.id.to_string(),
            sender_id: event.author.map(|a| a.id.to_string()).unwrap_or_default(),
            text,
            is_edited: true,
        }))
        .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else { return };
        acknowledge(&ctx, &component).await;
        self.emit(PlatformEvent::ButtonClick(ButtonClick {
            server_id: component.guild_id.map(|g| g.to_string()).unwrap_or_default(),
            channel_id: component.channel_id.to_string(),
            message_id: component.message.id.to_string(),
            sender_id: component.user.id.to_string(),
            custom_id: component.data.custom_id.clone(),
        }))
        .await;
    }
}

async fn acknowledge(ctx: &Context, component: &ComponentInteraction) {
    if let Err(e) = component.create_response(&ctx.http, CreateInteractionResponse::Acknowledge).await {
        warn!(error = %e, custom_id = %component.data.custom_id, "[Discord] Could not acknowledge interaction");
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct DiscordClient {
    token: String,
    intents: GatewayIntents,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: GatewayIntents::GUILDS
                | GatewayIntents::GUILD_MESSAGES
                | GatewayIntents::DIRECT_MESSAGES
                | GatewayIntents::MESSAGE_CONTENT,
        }
    }
}

#[async_trait]
impl PlatformClient for DiscordClient {
    fn name(&self) -> &str {
        "discord"
    }

    async fn login(&self, events: mpsc::Sender<PlatformEvent>) -> Result<Arc<dyn ConnectionHandle>, BotError> {
        info!("[Discord] Logging in");

        // Reject bad credentials here rather than inside the gateway task.
        let http = Http::new(&self.token);
        let me = http
            .get_current_user()
            .await
            .map_err(|e| BotError::Login(e.to_string()))?;
        debug!(user = %me.name, "[Discord] Token accepted");

        let summary: SharedSummary = Arc::new(RwLock::new(ConnectivitySummary {
            has_user: true,
            user_id: Some(me.id.to_string()),
            user_name: Some(me.name.clone()),
            server_count: 0,
        }));

        let mut client = Client::builder(&self.token, self.intents)
            .event_handler(Handler { events: events.clone(), summary: summary.clone() })
            .await
            .map_err(|e| BotError::Login(e.to_string()))?;

        let session = DiscordSession {
            http: client.http.clone(),
            shard_manager: client.shard_manager.clone(),
            summary,
            task: std::sync::Mutex::new(None),
        };

        let task = tokio::spawn(async move {
            if let Err(why) = client.start().await {
                error!(error = %why, "[Discord] Client stopped with error");
                let _ = events.send(PlatformEvent::Error(why.to_string())).await;
            }
        });
        *session.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        Ok(Arc::new(session))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct DiscordSession {
    http: Arc<Http>,
    shard_manager: Arc<ShardManager>,
    summary: SharedSummary,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl ConnectionHandle for DiscordSession {
    async fn probe(&self) -> Result<bool, BotError> {
        let task_alive = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_finished());
        if !task_alive {
            return Ok(false);
        }

        self.http
            .get_current_user()
            .await
            .map(|_| true)
            .map_err(|e| BotError::Probe(e.to_string()))
    }

    async fn shutdown(&self) {
        info!("[Discord] Shutting down session");
        self.shard_manager.shutdown_all().await;
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.abort();
        }
    }

    async fn send_reply(&self, channel: &ChannelRef, payload: ReplyPayload) -> Result<(), BotError> {
        let id: u64 = channel.channel_id.parse().map_err(|_| BotError::Delivery {
            channel_id: channel.channel_id.clone(),
            message: "not a Discord channel id".into(),
        })?;
        if id == 0 {
            return Err(BotError::Delivery {
                channel_id: channel.channel_id.clone(),
                message: "not a Discord channel id".into(),
            });
        }

        ChannelId::new(id)
            .send_message(&self.http, build_message(&payload))
            .await
            .map(|_| ())
            .map_err(|e| BotError::Delivery {
                channel_id: channel.channel_id.clone(),
                message: e.to_string(),
            })
    }

    fn connectivity(&self) -> ConnectivitySummary {
        self.summary.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
