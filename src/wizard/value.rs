//! Typed form values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::choice::{Currency, TagCategory};
use super::field::FieldName;

/// Opaque reference to an uploaded image (a Telegram `file_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An asking price.
///
/// The validator only produces the amount; currency and negotiability come
/// from the session toggles when the price is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
    pub negotiable: bool,
}

impl Money {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            currency: Currency::default(),
            negotiable: false,
        }
    }

    /// Amount without trailing zeros: `15.50` → `15.5`, `10.00` → `10`.
    pub fn display_amount(&self) -> String {
        self.amount.normalize().to_string()
    }
}

/// A validated phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    /// E.164 form, e.g. `+380991234567`.
    pub e164: String,
    /// Human-readable international form, e.g. `+380 99 123 4567`.
    pub international: String,
}

/// A value accepted by one of the field validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Money(Money),
    Phone(Phone),
    PhotoList(Vec<PhotoRef>),
    Tag(TagCategory),
}

impl Value {
    /// Whether this value may be stored under `field`.
    pub fn fits(&self, field: FieldName) -> bool {
        matches!(
            (field, self),
            (FieldName::Title, Value::Text(_))
                | (FieldName::Description, Value::Text(_))
                | (FieldName::Price, Value::Money(_))
                | (FieldName::Contact, Value::Phone(_))
                | (FieldName::Photo, Value::PhotoList(_))
                | (FieldName::Tags, Value::Tag(_))
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display_amount_drops_trailing_zeros() {
        assert_eq!(Money::new(dec!(15.50)).display_amount(), "15.5");
        assert_eq!(Money::new(dec!(10.00)).display_amount(), "10");
        assert_eq!(Money::new(dec!(0.25)).display_amount(), "0.25");
    }

    #[test]
    fn values_fit_only_their_field() {
        let text = Value::Text("Bike".into());
        assert!(text.fits(FieldName::Title));
        assert!(text.fits(FieldName::Description));
        assert!(!text.fits(FieldName::Price));
        assert!(!text.fits(FieldName::Preview));

        let money = Value::Money(Money::new(dec!(1)));
        assert!(money.fits(FieldName::Price));
        assert!(!money.fits(FieldName::Contact));

        let tag = Value::Tag(TagCategory::Sport);
        assert!(tag.fits(FieldName::Tags));
        assert!(!tag.fits(FieldName::Title));
    }
}
