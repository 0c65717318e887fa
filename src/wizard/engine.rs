//! Wizard engine: applies one inbound event to a session.
//!
//! Synchronous and I/O free. The caller loads the session, calls
//! [`Wizard::handle`], stores the session back and delivers the returned
//! [`Outcome`].

use chrono::Utc;
use tracing::{debug, info};

use super::choice::{self, AdKind};
use super::event::{Action, InboundEvent, MediaContent};
use super::field::{FieldName, InputKind};
use super::keyboard::{Keyboard, keyboard};
use super::navigation::{self, NavAction};
use super::photos;
use super::render::{DisplayText, render, render_error, render_notice};
use super::session::FormSession;
use super::submission::AdSubmission;
use super::validate::{ValidationError, ValidationReason, Validators};

/// What the user sees after an event: prompt text plus buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub field: FieldName,
    pub text: DisplayText,
    pub keyboard: Keyboard,
}

impl Screen {
    pub fn of(session: &FormSession) -> Self {
        Self::with_text(session, render(session))
    }

    fn with_text(session: &FormSession, text: DisplayText) -> Self {
        Self {
            field: session.current_field(),
            text,
            keyboard: keyboard(session),
        }
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Input accepted or navigation applied; the new screen.
    Rendered(Screen),
    /// Input rejected. The session is unchanged.
    ValidationFailed { error: ValidationError, screen: Screen },
    /// `done` with every required field set. The session is finished.
    Submitted {
        submission: AdSubmission,
        screen: Screen,
    },
    /// `done` with required fields missing. The session is unchanged.
    Incomplete {
        missing: Vec<FieldName>,
        screen: Screen,
    },
    /// The user left the wizard. The session should be discarded.
    Exited,
}

impl Outcome {
    pub fn screen(&self) -> Option<&Screen> {
        match self {
            Self::Rendered(screen)
            | Self::ValidationFailed { screen, .. }
            | Self::Submitted { screen, .. }
            | Self::Incomplete { screen, .. } => Some(screen),
            Self::Exited => None,
        }
    }

    /// Whether the session ends with this outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted { .. } | Self::Exited)
    }
}

/// The sell wizard.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    validators: Validators,
}

impl Wizard {
    pub fn new(validators: Validators) -> Self {
        Self { validators }
    }

    /// Fresh session on the title field with default choices applied.
    pub fn start(&self, kind: AdKind) -> (FormSession, Screen) {
        let session = FormSession::new(kind);
        let screen = Screen::of(&session);
        (session, screen)
    }

    /// Apply `event` to `session`.
    ///
    /// An event addressed to a field other than the active one is stale
    /// (typically a button under an older message) and only re-renders.
    pub fn handle(&self, session: &mut FormSession, event: InboundEvent) -> Outcome {
        let active = session.current_field();
        if event.field() != active {
            debug!(event_field = %event.field(), active = %active, "Stale event, re-rendering");
            return Outcome::Rendered(Screen::of(session));
        }

        let result = match event {
            InboundEvent::TextInput { raw, .. } => self.on_text(session, &raw),
            InboundEvent::MediaInput { content, .. } => self.on_media(session, &content),
            InboundEvent::ButtonPress { action, .. } => return self.on_button(session, action),
        };

        match result {
            Ok(()) => Outcome::Rendered(Screen::of(session)),
            Err(error) => {
                debug!(field = %error.field, reason = %error.reason, "Input rejected");
                let screen = Screen::with_text(session, render_error(session, &error));
                Outcome::ValidationFailed { error, screen }
            }
        }
    }

    fn on_text(&self, session: &mut FormSession, raw: &str) -> Result<(), ValidationError> {
        let field = session.current_field();
        match field.input_kind() {
            InputKind::Text => {
                let value = self.validators.validate_text(field, raw)?;
                session.store_value(field, value);
                navigation::advance(session);
                Ok(())
            }
            InputKind::Media | InputKind::Selection => {
                self.validators.validate_text(field, raw).map(|_| ())
            }
            InputKind::None => Ok(()),
        }
    }

    fn on_media(
        &self,
        session: &mut FormSession,
        content: &MediaContent,
    ) -> Result<(), ValidationError> {
        let field = session.current_field();
        match (field, content) {
            (FieldName::Photo, _) => {
                let count = photos::collect(session, content)?;
                debug!(count, "Photo collected");
                Ok(())
            }
            (FieldName::Contact, MediaContent::Contact { phone_number }) => {
                let value = self.validators.validate_contact(phone_number)?;
                session.store_value(field, value);
                navigation::advance(session);
                Ok(())
            }
            (FieldName::Tags, _) => Err(ValidationError::new(
                field,
                ValidationReason::ExpectedSelection,
            )),
            (FieldName::Preview | FieldName::Done, _) => Ok(()),
            (FieldName::Title | FieldName::Description | FieldName::Price | FieldName::Contact, _) => {
                Err(ValidationError::new(field, ValidationReason::ExpectedText))
            }
        }
    }

    fn on_button(&self, session: &mut FormSession, action: Action) -> Outcome {
        let field = session.current_field();
        let result = match action {
            Action::Left => {
                navigation::navigate(session, NavAction::Back);
                Ok(())
            }
            Action::Right => {
                navigation::navigate(session, NavAction::Next);
                Ok(())
            }
            Action::Page => Ok(()),
            Action::Preview => {
                navigation::navigate(session, NavAction::SwitchTo(FieldName::Preview));
                Ok(())
            }
            Action::Done => return self.finish(session),
            Action::Exit => {
                info!(kind = session.kind().as_str(), "Wizard exited");
                return Outcome::Exited;
            }
            Action::SelectTag(tag) if field == FieldName::Tags => {
                choice::select_tag(session, tag)
            }
            Action::DeleteTag if field == FieldName::Tags => {
                choice::delete_tag(session);
                Ok(())
            }
            Action::SelectCurrency(currency) if field == FieldName::Price => {
                choice::select_currency(session, currency);
                Ok(())
            }
            Action::ToggleNegotiable if field == FieldName::Price => {
                choice::toggle_negotiable(session);
                Ok(())
            }
            Action::SelectTag(_)
            | Action::DeleteTag
            | Action::SelectCurrency(_)
            | Action::ToggleNegotiable => {
                debug!(field = %field, action = ?action, "Choice button outside its page");
                Ok(())
            }
        };

        match result {
            Ok(()) => Outcome::Rendered(Screen::of(session)),
            Err(error) => {
                let screen = Screen::with_text(session, render_error(session, &error));
                Outcome::ValidationFailed { error, screen }
            }
        }
    }

    fn finish(&self, session: &mut FormSession) -> Outcome {
        match AdSubmission::from_session(session) {
            Ok(submission) => {
                navigation::navigate(session, NavAction::SwitchTo(FieldName::Done));
                let elapsed = Utc::now() - session.started_at();
                info!(
                    ad_id = %submission.id,
                    kind = submission.kind.as_str(),
                    elapsed_secs = elapsed.num_seconds(),
                    "Ad submitted"
                );
                Outcome::Submitted {
                    submission,
                    screen: Screen::of(session),
                }
            }
            Err(missing) => {
                let names: Vec<&str> = missing.iter().map(|f| f.section()).collect();
                let notice = format!("Заполните обязательные поля: {}.", names.join(", "));
                debug!(missing = ?missing, "Submission incomplete");
                Outcome::Incomplete {
                    missing,
                    screen: Screen::with_text(session, render_notice(session, &notice)),
                }
            }
        }
    }
}
