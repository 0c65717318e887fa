//! The bot: turns channel messages into wizard events and wizard outcomes
//! into replies.
//!
//! [`Bot::handle`] processes one message for one session. The
//! [`Dispatcher`] owns the channel streams and makes sure each session sees
//! its messages one at a time.

pub mod command;
pub mod dispatcher;

pub use command::{Command, CommandParser};
pub use dispatcher::Dispatcher;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channels::{IncomingMessage, MessageContent, OutgoingResponse};
use crate::store::{AdStore, SessionKey, SessionStore};
use crate::wizard::{Action, AdKind, FieldName, InboundEvent, Outcome, Wizard};

pub const NO_SESSION_HINT: &str = "Нажмите /sell, чтобы создать объявление.";
pub const EXIT_TEXT: &str = "Вы вышли из режима создания объявления.";
pub const SAVE_FAILED_TEXT: &str =
    "⚠️ Не удалось сохранить объявление. Попробуйте нажать «Готово» ещё раз.";
pub const HELP_TEXT: &str = "/sell: создать объявление о продаже\n\
                             /buy: создать объявление о покупке\n\
                             /cancel: выйти из редактора";

/// Per-message handler shared by all session workers.
pub struct Bot {
    wizard: Wizard,
    sessions: Arc<dyn SessionStore>,
    ads: Arc<dyn AdStore>,
}

impl Bot {
    pub fn new(wizard: Wizard, sessions: Arc<dyn SessionStore>, ads: Arc<dyn AdStore>) -> Self {
        Self {
            wizard,
            sessions,
            ads,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Handle one message. `None` means there is nothing to send back.
    pub async fn handle(&self, message: &IncomingMessage) -> Option<OutgoingResponse> {
        let key = message.session_key();
        let command = CommandParser::parse(&message.content);
        if command.is_control() {
            debug!(user = %key, ?command, "Control command");
        }

        match command {
            Command::Start(kind) => Some(self.start(&key, kind).await),
            Command::Cancel => {
                self.sessions.remove(&key).await;
                info!(user = %key, "Wizard cancelled");
                Some(OutgoingResponse::text(EXIT_TEXT))
            }
            Command::Help => Some(OutgoingResponse::text(HELP_TEXT)),
            Command::Input => self.input(&key, &message.content).await,
        }
    }

    async fn start(&self, key: &SessionKey, kind: AdKind) -> OutgoingResponse {
        if self.sessions.remove(key).await.is_some() {
            debug!(user = %key, "Discarding previous session");
        }
        let (session, screen) = self.wizard.start(kind);
        self.sessions.put(key, session).await;
        info!(user = %key, kind = kind.as_str(), "Wizard started");
        OutgoingResponse::screen(screen)
    }

    async fn input(&self, key: &SessionKey, content: &MessageContent) -> Option<OutgoingResponse> {
        let Some(mut session) = self.sessions.get(key).await else {
            return Some(OutgoingResponse::text(NO_SESSION_HINT));
        };

        let event = to_event(session.current_field(), content)?;
        let before = session.clone();

        match self.wizard.handle(&mut session, event) {
            Outcome::Exited => {
                self.sessions.remove(key).await;
                info!(user = %key, "Wizard exited");
                Some(OutgoingResponse::text(EXIT_TEXT))
            }
            Outcome::Submitted { submission, screen } => {
                if let Err(e) = self.ads.insert_ad(key, &submission).await {
                    error!(user = %key, ad = %submission.id, "Failed to save ad: {e}");
                    // Roll back so the user can retry from where they were.
                    self.sessions.put(key, before).await;
                    return Some(OutgoingResponse::text(SAVE_FAILED_TEXT));
                }
                self.sessions.remove(key).await;
                info!(user = %key, ad = %submission.id, "Ad saved");
                Some(OutgoingResponse::screen(screen))
            }
            Outcome::ValidationFailed { error, screen } => {
                debug!(user = %key, field = %error.field, "Validation failed: {}", error.message());
                self.sessions.put(key, session).await;
                Some(OutgoingResponse::screen(screen))
            }
            Outcome::Rendered(screen) | Outcome::Incomplete { screen, .. } => {
                self.sessions.put(key, session).await;
                Some(OutgoingResponse::screen(screen))
            }
        }
    }
}

/// Address message content to the field the user is looking at.
///
/// Returns `None` for callback data that names no known action.
fn to_event(field: FieldName, content: &MessageContent) -> Option<InboundEvent> {
    match content {
        MessageContent::Text(raw) => Some(InboundEvent::TextInput {
            field,
            raw: raw.clone(),
        }),
        MessageContent::Callback { data, .. } => match data.parse::<Action>() {
            Ok(action) => Some(InboundEvent::ButtonPress { field, action }),
            Err(e) => {
                warn!(field = %field, "Ignoring button press: {e}");
                None
            }
        },
        MessageContent::Media(media) => Some(InboundEvent::MediaInput {
            field,
            content: media.clone(),
        }),
    }
}
