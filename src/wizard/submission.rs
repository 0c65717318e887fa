//! Finalized ad handed to the ad store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choice::{AdKind, Currency, TagCategory, make_tags};
use super::field::FieldName;
use super::session::FormSession;
use super::value::PhotoRef;

/// Fields that must be set before `done` is accepted.
pub const REQUIRED: [FieldName; 4] = [
    FieldName::Title,
    FieldName::Description,
    FieldName::Price,
    FieldName::Contact,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSubmission {
    pub id: Uuid,
    pub kind: AdKind,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    pub negotiable: bool,
    /// E.164.
    pub contact: String,
    pub photos: Vec<PhotoRef>,
    pub tag: Option<TagCategory>,
    pub created_at: DateTime<Utc>,
}

impl AdSubmission {
    /// Build a submission from a session, or list the unset required fields.
    pub fn from_session(session: &FormSession) -> Result<Self, Vec<FieldName>> {
        let missing = missing_fields(session);
        if !missing.is_empty() {
            return Err(missing);
        }

        let (Some(title), Some(description), Some(price), Some(contact)) = (
            session.text(FieldName::Title),
            session.text(FieldName::Description),
            session.price(),
            session.contact(),
        ) else {
            unreachable!("required fields checked above");
        };

        Ok(Self {
            id: Uuid::new_v4(),
            kind: session.kind(),
            title: title.to_string(),
            description: description.to_string(),
            price: price.amount,
            currency: price.currency,
            negotiable: price.negotiable,
            contact: contact.e164.clone(),
            photos: session.photos().to_vec(),
            tag: session.tag(),
            created_at: Utc::now(),
        })
    }

    /// Tag line as it appears in the published ad.
    pub fn tags_line(&self) -> String {
        make_tags(self.kind, self.tag)
    }
}

/// Required fields still unset, in schema order.
pub fn missing_fields(session: &FormSession) -> Vec<FieldName> {
    REQUIRED
        .into_iter()
        .filter(|f| !session.is_set(*f))
        .collect()
}
