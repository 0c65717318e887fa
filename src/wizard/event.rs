//! Inbound events and button actions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::choice::{Currency, TagCategory};
use super::field::FieldName;

/// Content of a non-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaContent {
    /// An image; `file_id` of the largest available size.
    Photo { file_id: String },
    /// A shared contact card.
    Contact { phone_number: String },
    /// Anything else (document, sticker, video, voice, ...).
    Other { kind: String },
}

impl MediaContent {
    pub fn kind(&self) -> &str {
        match self {
            Self::Photo { .. } => "photo",
            Self::Contact { .. } => "contact",
            Self::Other { kind } => kind,
        }
    }
}

/// A button on the wizard keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `<<`: previous field, wrapping from title to tags.
    Left,
    /// `>>`: next field.
    Right,
    /// The page indicator between the arrows; re-renders only.
    Page,
    Preview,
    Done,
    /// Leave the wizard, discarding the session.
    Exit,
    SelectTag(TagCategory),
    DeleteTag,
    SelectCurrency(Currency),
    ToggleNegotiable,
}

impl Action {
    /// Encode as Telegram callback data.
    pub fn callback_data(&self) -> String {
        match self {
            Self::Left => "left".to_string(),
            Self::Right => "right".to_string(),
            Self::Page => "page".to_string(),
            Self::Preview => "preview".to_string(),
            Self::Done => "done".to_string(),
            Self::Exit => "exit".to_string(),
            Self::SelectTag(tag) => format!("tag:{}", tag.id()),
            Self::DeleteTag => "delete_tag".to_string(),
            Self::SelectCurrency(currency) => format!("currency:{}", currency.code()),
            Self::ToggleNegotiable => "negotiable".to_string(),
        }
    }
}

/// Callback data that does not name a known action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownAction(s.to_string());
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "page" => Ok(Self::Page),
            "preview" => Ok(Self::Preview),
            "done" => Ok(Self::Done),
            "exit" => Ok(Self::Exit),
            "delete_tag" => Ok(Self::DeleteTag),
            "negotiable" => Ok(Self::ToggleNegotiable),
            _ => {
                if let Some(id) = s.strip_prefix("tag:") {
                    TagCategory::from_id(id)
                        .map(Self::SelectTag)
                        .ok_or_else(unknown)
                } else if let Some(code) = s.strip_prefix("currency:") {
                    Currency::from_code(code)
                        .map(Self::SelectCurrency)
                        .ok_or_else(unknown)
                } else {
                    Err(unknown())
                }
            }
        }
    }
}

/// One inbound user action, addressed to the field the user was looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TextInput { field: FieldName, raw: String },
    ButtonPress { field: FieldName, action: Action },
    MediaInput { field: FieldName, content: MediaContent },
}

impl InboundEvent {
    pub fn field(&self) -> FieldName {
        match self {
            Self::TextInput { field, .. }
            | Self::ButtonPress { field, .. }
            | Self::MediaInput { field, .. } => *field,
        }
    }
}
