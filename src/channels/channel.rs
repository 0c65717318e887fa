//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::store::SessionKey;
use crate::wizard::{DisplayText, Keyboard, MediaContent, Screen};

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// A text message (including `/commands`).
    Text(String),
    /// An inline button press carrying its callback data.
    Callback { id: String, data: String },
    /// A non-text attachment.
    Media(MediaContent),
}

/// A message received from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub channel: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub content: MessageContent,
    pub received_at: DateTime<Utc>,
    /// Channel-specific routing data (e.g. Telegram `chat_id`, `message_id`).
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content,
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Shorthand for a text message.
    pub fn text(channel: &str, user_id: &str, text: &str) -> Self {
        Self::new(channel, user_id, MessageContent::Text(text.to_string()))
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.channel.clone(), self.user_id.clone())
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.content, MessageContent::Callback { .. })
    }
}

/// A reply: formatted text plus an optional inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: DisplayText,
    pub keyboard: Keyboard,
}

impl OutgoingResponse {
    /// A plain notice without buttons.
    pub fn text(text: impl Into<String>) -> Self {
        let mut content = DisplayText::new();
        content.plain(text);
        Self {
            content,
            keyboard: Keyboard::default(),
        }
    }

    pub fn screen(screen: Screen) -> Self {
        Self {
            content: screen.text,
            keyboard: screen.keyboard,
        }
    }
}

pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A transport the bot talks through.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
