//! Discord gateway worker.
//!
//! Connects as a bot, listens for @mentions and replies to the bot's own
//! messages, and answers through the shared [`ConversationService`].

use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Context as _, Result};
use serenity::client::{Client, Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::UserId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::service::{ConversationService, InboundMessage, RepliedMessage};

/// Discord rejects messages longer than this many characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

struct Handler {
    service: Arc<ConversationService>,
    /// Set on Ready, used to filter self and mentions
    bot_id: OnceLock<UserId>,
}

impl Handler {
    fn new(service: Arc<ConversationService>) -> Self {
        Self {
            service,
            bot_id: OnceLock::new(),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let id = ready.user.id;
        let _ = self.bot_id.set(id);
        info!(bot_id = %id, "Discord: Bot connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        let Some(bot_id) = self.bot_id.get().copied() else {
            debug!("Discord: Ignoring message (bot id not set yet)");
            return;
        };

        let mentions: Vec<UserId> = new_message.mentions.iter().map(|u| u.id).collect();
        let replied_author = new_message.referenced_message.as_ref().map(|m| m.author.id);
        if !addressed_to_bot(bot_id, new_message.author.id, &mentions, replied_author) {
            return;
        }

        let inbound = to_inbound(&new_message);
        info!(
            session_id = %inbound.session_id,
            message_id = %inbound.message_id,
            author = %inbound.author,
            is_reply = inbound.replied_to.is_some(),
            "Discord: message for bot"
        );

        let Some(reply) = self.service.respond(&inbound).await else {
            return;
        };

        for chunk in split_message(&reply, DISCORD_MESSAGE_LIMIT) {
            if let Err(e) = new_message.channel_id.say(&ctx, chunk).await {
                error!("Discord: Failed to send reply: {}", e);
                break;
            }
        }
    }
}

/// Whether a message should get an answer: never our own, otherwise when the
/// bot is mentioned or the message replies to one of the bot's messages.
pub fn addressed_to_bot(bot_id: UserId, author: UserId, mentions: &[UserId], replied_author: Option<UserId>) -> bool {
    if author == bot_id {
        return false;
    }
    mentions.contains(&bot_id) || replied_author == Some(bot_id)
}

fn to_inbound(message: &Message) -> InboundMessage {
    InboundMessage {
        session_id: message.channel_id.to_string(),
        message_id: message.id.to_string(),
        author: message.author.display_name().to_string(),
        text: message.content.clone(),
        replied_to: message.referenced_message.as_ref().map(|replied| RepliedMessage {
            author: replied.author.display_name().to_string(),
            text: replied.content.clone(),
        }),
    }
}

/// Split `text` into pieces of at most `limit` characters, preferring line
/// breaks. Never splits inside a character.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        let hard = rest.char_indices().nth(limit).map(|(i, _)| i).unwrap_or(rest.len());
        let cut = match rest[..hard].rfind('\n') {
            Some(pos) if pos > 0 => pos + 1,
            _ => hard,
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

struct RunningGateway {
    shard_manager: Arc<ShardManager>,
    task: JoinHandle<()>,
}

/// Owns the Discord client task. At most one connection per worker.
pub struct GatewayWorker {
    token: Option<String>,
    service: Arc<ConversationService>,
    running: Mutex<Option<RunningGateway>>,
}

impl GatewayWorker {
    pub fn new(token: Option<String>, service: Arc<ConversationService>) -> Self {
        Self {
            token,
            service,
            running: Mutex::new(None),
        }
    }

    /// Connect to the gateway in a background task.
    ///
    /// Returns `false` if a connection is already running.
    pub async fn start(&self) -> Result<bool> {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            debug!("Discord: Gateway already running");
            return Ok(false);
        }

        let token = self
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_BOT_TOKEN environment variable is required to start the gateway"))?;

        info!("Discord: Connecting to Discord Gateway");
        let mut client = Client::builder(token, intents())
            .event_handler(Handler::new(self.service.clone()))
            .await
            .context("Discord client build failed")?;

        let shard_manager = client.shard_manager.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = client.start().await {
                error!("Discord gateway error: {}", e);
            }
            info!("Discord: Gateway task finished");
        });

        *running = Some(RunningGateway { shard_manager, task });
        Ok(true)
    }

    /// Shut down all shards and wait for the client task.
    ///
    /// Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let Some(gateway) = self.running.lock().await.take() else {
            debug!("Discord: No gateway running, skipping stop");
            return false;
        };

        info!("Discord: Shutting down gateway");
        gateway.shard_manager.shutdown_all().await;
        if let Err(e) = gateway.task.await {
            warn!("Discord: Gateway task ended abnormally: {}", e);
        }
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }
}
