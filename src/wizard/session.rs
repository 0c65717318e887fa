//! Form session: per-user mutable wizard state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::choice::{AdKind, Currency, TagCategory};
use super::field::FieldName;
use super::navigation::TransitionCause;
use super::photos::MAX_PHOTOS;
use super::value::{Money, Phone, PhotoRef, Value};

/// Number of transitions kept in the session history.
const HISTORY_LIMIT: usize = 32;

/// One recorded move of the active-field pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransition {
    pub from: FieldName,
    pub to: FieldName,
    pub cause: TransitionCause,
    pub timestamp: DateTime<Utc>,
}

/// Values collected from the text fields, keyed by the closed field enum.
///
/// Only title, description, price and contact are keys, each holding its own
/// `Value` variant. Anything else is a programming defect, and a
/// serialized map breaking the rule is rejected on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<FieldName, Value>")]
pub struct FieldValues(BTreeMap<FieldName, Value>);

impl TryFrom<BTreeMap<FieldName, Value>> for FieldValues {
    type Error = String;

    fn try_from(map: BTreeMap<FieldName, Value>) -> Result<Self, Self::Error> {
        let mut values = Self::default();
        for (field, value) in map {
            if !field.is_value_field() || !value.fits(field) {
                return Err(format!("value {value:?} cannot be stored under {field}"));
            }
            values.insert(field, value);
        }
        Ok(values)
    }
}

impl FieldValues {
    pub fn get(&self, field: FieldName) -> Option<&Value> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    pub(crate) fn insert(&mut self, field: FieldName, value: Value) {
        assert!(
            field.is_value_field() && value.fits(field),
            "value {value:?} cannot be stored under {field}"
        );
        self.0.insert(field, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// State of one user's wizard conversation.
///
/// Fields are private: the pointer moves only through the navigation
/// controller and values change only through accepted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSession {
    kind: AdKind,
    current_field: FieldName,
    values: FieldValues,
    tag: Option<TagCategory>,
    currency: Currency,
    negotiable: bool,
    photos: Vec<PhotoRef>,
    history: Vec<FieldTransition>,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new(AdKind::default())
    }
}

impl FormSession {
    /// Start a session on the title field with default choices.
    pub fn new(kind: AdKind) -> Self {
        let now = Utc::now();
        Self {
            kind,
            current_field: FieldName::Title,
            values: FieldValues::default(),
            tag: None,
            currency: Currency::default(),
            negotiable: false,
            photos: Vec::new(),
            history: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> AdKind {
        self.kind
    }

    pub fn current_field(&self) -> FieldName {
        self.current_field
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn tag(&self) -> Option<TagCategory> {
        self.tag
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn negotiable(&self) -> bool {
        self.negotiable
    }

    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    pub fn history(&self) -> &[FieldTransition] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Text stored for title or description.
    pub fn text(&self, field: FieldName) -> Option<&str> {
        self.values.get(field).and_then(Value::as_text)
    }

    /// The price with the session's currency and negotiability applied.
    pub fn price(&self) -> Option<Money> {
        match self.values.get(FieldName::Price) {
            Some(Value::Money(money)) => Some(Money {
                amount: money.amount,
                currency: self.currency,
                negotiable: self.negotiable,
            }),
            _ => None,
        }
    }

    pub fn contact(&self) -> Option<&Phone> {
        match self.values.get(FieldName::Contact) {
            Some(Value::Phone(phone)) => Some(phone),
            _ => None,
        }
    }

    pub fn is_set(&self, field: FieldName) -> bool {
        match field {
            FieldName::Photo => !self.photos.is_empty(),
            FieldName::Tags => self.tag.is_some(),
            _ => self.values.contains(field),
        }
    }

    // ── Mutators (crate-internal; driven by the engine) ─────────────

    pub(crate) fn set_current_field(&mut self, transition: FieldTransition) {
        assert_eq!(
            transition.from, self.current_field,
            "transition does not start at the active field"
        );
        self.current_field = transition.to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(transition);
        self.touch();
    }

    pub(crate) fn store_value(&mut self, field: FieldName, value: Value) {
        self.values.insert(field, value);
        self.touch();
    }

    pub(crate) fn set_tag(&mut self, tag: TagCategory) {
        self.tag = Some(tag);
        self.touch();
    }

    pub(crate) fn clear_tag(&mut self) -> Option<TagCategory> {
        self.touch();
        self.tag.take()
    }

    pub(crate) fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
        self.touch();
    }

    pub(crate) fn toggle_negotiable(&mut self) -> bool {
        self.negotiable = !self.negotiable;
        self.touch();
        self.negotiable
    }

    pub(crate) fn push_photo(&mut self, photo: PhotoRef) {
        assert!(self.photos.len() < MAX_PHOTOS, "photo collection is full");
        self.photos.push(photo);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
