//! Telegram channel: long-polls the Bot API for updates.
//!
//! Text, photos, shared contacts and inline-button presses are turned into
//! `IncomingMessage`s. Replies are sent in HTML parse mode with an inline
//! keyboard; a button press edits the message it came from.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::channels::{Channel, IncomingMessage, MessageContent, MessageStream, OutgoingResponse};
use crate::error::ChannelError;
use crate::wizard::{DisplayText, Keyboard, MediaContent};

/// Maximum visible text length (UTF-16 units) for sendMessage and
/// editMessageText.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Attachment kinds recognized for the "not an image" path, in lookup order.
const OTHER_MEDIA_KINDS: [&str; 8] = [
    "document",
    "sticker",
    "video",
    "animation",
    "voice",
    "audio",
    "video_note",
    "location",
];

pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Check if a username or numeric id is in the allowed list.
    pub fn is_user_allowed(&self, identity: &str) -> bool {
        check_user_allowed(&self.allowed_users, [identity])
    }

    async fn call(&self, method: &str, body: &Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::Http(format!("{method}: {e}")))?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let err = resp.text().await.unwrap_or_default();
        Err(ChannelError::SendFailed {
            name: "telegram".into(),
            reason: format!("{method} returned {status}: {err}"),
        })
    }

    /// Send text as one or more HTML messages within the length limit.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &DisplayText,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError> {
        for body in send_bodies(chat_id, text, keyboard, TELEGRAM_MAX_MESSAGE_LENGTH) {
            self.call("sendMessage", &body).await?;
        }
        Ok(())
    }

    /// Replace the text and keyboard of a message the bot sent earlier.
    async fn edit_message(
        &self,
        chat_id: &str,
        message_id: i64,
        html: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": html,
            "parse_mode": "HTML",
            "reply_markup": inline_keyboard(keyboard),
        });
        match self.call("editMessageText", &body).await {
            // Re-rendering an unchanged screen is not a failure.
            Err(ChannelError::SendFailed { reason, .. }) if reason.contains("not modified") => {
                Ok(())
            }
            other => other,
        }
    }

    async fn answer_callback(&self, callback_id: &str) {
        let body = json!({ "callback_query_id": callback_id });
        if let Err(e) = self.call("answerCallbackQuery", &body).await {
            tracing::debug!("Telegram answerCallbackQuery failed: {e}");
        }
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client
                    .post(api_url(&bot_token, "getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(Value::as_array) else {
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(incoming) = parse_update(update) else {
                        continue;
                    };

                    let username = incoming.metadata["username"].as_str().unwrap_or("unknown");
                    if !check_user_allowed(&allowed_users, [username, incoming.user_id.as_str()]) {
                        tracing::warn!(
                            "Telegram: ignoring update from unauthorized user: \
                             username={username}, user_id={}",
                            incoming.user_id
                        );
                        continue;
                    }

                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let chat_id = msg
            .metadata
            .get("chat_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in message metadata".into(),
            })?;
        let content = &response.content;

        if let MessageContent::Callback { id, .. } = &msg.content {
            self.answer_callback(id).await;
            // A screen over the limit cannot replace one message; send it fresh
            let message_id = msg.metadata.get("message_id").and_then(Value::as_i64);
            if let Some(message_id) =
                message_id.filter(|_| content.visible_len() <= TELEGRAM_MAX_MESSAGE_LENGTH)
            {
                match self
                    .edit_message(chat_id, message_id, &content.to_html(), &response.keyboard)
                    .await
                {
                    Ok(()) => return Ok(()),
                    Err(e) => tracing::warn!("Telegram edit failed, sending new message: {e}"),
                }
            }
        }

        self.send_message(chat_id, content, &response.keyboard).await
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(token: &SecretString, method: &str) -> String {
    format!("https://api.telegram.org/bot{}/{method}", token.expose_secret())
}

/// Check if any identity matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Turn one `getUpdates` entry into an incoming message.
///
/// Returns `None` for update types the bot does not handle.
fn parse_update(update: &Value) -> Option<IncomingMessage> {
    if let Some(callback) = update.get("callback_query") {
        let id = callback.get("id")?.as_str()?.to_string();
        let data = callback.get("data")?.as_str()?.to_string();
        let message = callback.get("message");
        let chat_id = message
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);
        let message_id = message
            .and_then(|m| m.get("message_id"))
            .and_then(Value::as_i64);
        return Some(build_incoming(
            callback.get("from")?,
            chat_id,
            message_id,
            MessageContent::Callback { id, data },
        ));
    }

    let message = update.get("message")?;
    let content = if let Some(text) = message.get("text").and_then(Value::as_str) {
        MessageContent::Text(text.to_string())
    } else if let Some(sizes) = message.get("photo").and_then(Value::as_array) {
        // Sizes are ascending; the last is the largest.
        let file_id = sizes.last()?.get("file_id")?.as_str()?.to_string();
        MessageContent::Media(MediaContent::Photo { file_id })
    } else if let Some(contact) = message.get("contact") {
        let phone_number = contact.get("phone_number")?.as_str()?.to_string();
        MessageContent::Media(MediaContent::Contact { phone_number })
    } else {
        let kind = OTHER_MEDIA_KINDS
            .into_iter()
            .find(|k| message.get(*k).is_some())
            .unwrap_or("unknown");
        MessageContent::Media(MediaContent::Other {
            kind: kind.to_string(),
        })
    };

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64);
    Some(build_incoming(message.get("from")?, chat_id, None, content))
}

fn build_incoming(
    from: &Value,
    chat_id: Option<i64>,
    message_id: Option<i64>,
    content: MessageContent,
) -> IncomingMessage {
    let username = from
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let user_id = from
        .get("id")
        .and_then(Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_else(|| username.to_string());
    let first_name = from.get("first_name").and_then(Value::as_str);

    let mut metadata = json!({
        "chat_id": chat_id.map(|id| id.to_string()).unwrap_or_default(),
        "username": username,
    });
    if let Some(message_id) = message_id {
        metadata["message_id"] = json!(message_id);
    }

    IncomingMessage::new("telegram", &user_id, content)
        .with_metadata(metadata)
        .with_user_name(first_name.unwrap_or(username))
}

/// `reply_markup` for an inline keyboard.
fn inline_keyboard(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.label, "callback_data": b.action.callback_data() }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// `sendMessage` bodies for `text`, split so each chunk's visible text
/// fits `max_len` and renders to well-formed HTML. The keyboard goes on
/// the last chunk.
fn send_bodies(
    chat_id: &str,
    text: &DisplayText,
    keyboard: &Keyboard,
    max_len: usize,
) -> Vec<Value> {
    let chunks = text.split(max_len);
    let last = chunks.len().saturating_sub(1);

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut body = json!({
                "chat_id": chat_id,
                "text": chunk.to_html(),
                "parse_mode": "HTML",
            });
            if i == last && !keyboard.rows.is_empty() {
                body["reply_markup"] = inline_keyboard(keyboard);
            }
            body
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
