//! Validator registry: pure functions from raw input to typed values.
//!
//! Validators never touch session state. A failure names the field and a
//! typed reason; the user-facing text comes from [`ValidationError::message`].

use std::str::FromStr;

use phonenumber::{Mode, PhoneNumber, country};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::choice::TagCategory;
use super::event::MediaContent;
use super::field::FieldName;
use super::photos::MAX_PHOTOS;
use super::value::{Money, Phone, PhotoRef, Value};

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 64;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1024;

/// Prices must be strictly greater than this.
pub fn min_price() -> Decimal {
    dec!(0.01)
}

/// Why an input was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationReason {
    #[error("longer than {max} characters")]
    TooLong { max: usize },

    #[error("not a number")]
    NotANumber,

    #[error("price must be greater than 0.01")]
    PriceTooLow,

    #[error("not a valid phone number")]
    InvalidPhone,

    #[error("not an image")]
    NotAnImage,

    #[error("at most {max} photos")]
    PhotoLimitReached { max: usize },

    #[error("expected a text message")]
    ExpectedText,

    #[error("expected a button selection")]
    ExpectedSelection,

    #[error("unknown tag {0}")]
    UnknownTag(String),

    #[error("a tag is already selected")]
    TagAlreadySet,
}

/// The only error the wizard engine produces. Always recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: FieldName,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: FieldName, reason: ValidationReason) -> Self {
        Self { field, reason }
    }

    /// Message shown to the user above the re-rendered prompt.
    pub fn message(&self) -> String {
        match (&self.reason, self.field) {
            (ValidationReason::TooLong { max }, FieldName::Description) => format!(
                "Максимальная длина описания товара или услуг {max} символов. Попробуйте еще раз."
            ),
            (ValidationReason::TooLong { max }, _) => format!(
                "Максимальная длина заголовка товара или услуг {max} символов. Попробуйте еще раз."
            ),
            (ValidationReason::NotANumber | ValidationReason::PriceTooLow, _) => {
                "Цена должна быть числом и быть больше 0.01. Попробуйте еще раз.".to_string()
            }
            (ValidationReason::InvalidPhone, _) => {
                "Вы ввели не валидный номер! Попробуйте еще раз.".to_string()
            }
            (ValidationReason::NotAnImage, _) => {
                "Вы ввели не валидную картинку! Попробуйте еще раз.".to_string()
            }
            (ValidationReason::PhotoLimitReached { max }, _) => {
                format!("Можно добавить не более {max} картинок.")
            }
            (ValidationReason::ExpectedText, _) => {
                "Отправьте текстовое сообщение. Попробуйте еще раз.".to_string()
            }
            (ValidationReason::ExpectedSelection, _) | (ValidationReason::UnknownTag(_), _) => {
                "Выберите тег с помощью кнопок ниже.".to_string()
            }
            (ValidationReason::TagAlreadySet, _) => {
                "Сначала удалите текущий тег, затем установите новый.".to_string()
            }
        }
    }
}

/// Dispatch table from field to validator.
///
/// Holds the only configurable validator input: the region used to read
/// phone numbers written in national format.
#[derive(Debug, Clone)]
pub struct Validators {
    default_region: Option<country::Id>,
}

impl Default for Validators {
    fn default() -> Self {
        Self {
            default_region: Some(country::Id::UA),
        }
    }
}

impl Validators {
    pub fn new(default_region: Option<country::Id>) -> Self {
        Self { default_region }
    }

    /// Validate free text for `field`.
    ///
    /// Fields that do not take text reject it with `ExpectedText`'s
    /// counterpart for their input kind.
    pub fn validate_text(&self, field: FieldName, raw: &str) -> Result<Value, ValidationError> {
        match field {
            FieldName::Title => validate_title(raw),
            FieldName::Description => validate_description(raw),
            FieldName::Price => validate_price(raw),
            FieldName::Contact => validate_phone(raw, self.default_region).map(Value::Phone),
            FieldName::Photo => Err(ValidationError::new(field, ValidationReason::NotAnImage)),
            FieldName::Tags => Err(ValidationError::new(
                field,
                ValidationReason::ExpectedSelection,
            )),
            FieldName::Preview | FieldName::Done => {
                unreachable!("{field} does not accept input")
            }
        }
    }

    /// Validate a shared contact card for the contact field.
    pub fn validate_contact(&self, phone_number: &str) -> Result<Value, ValidationError> {
        validate_phone(phone_number, self.default_region).map(Value::Phone)
    }
}

fn check_length(field: FieldName, raw: &str, max: usize) -> Result<Value, ValidationError> {
    if raw.chars().count() > max {
        return Err(ValidationError::new(
            field,
            ValidationReason::TooLong { max },
        ));
    }
    Ok(Value::Text(raw.to_string()))
}

pub fn validate_title(raw: &str) -> Result<Value, ValidationError> {
    check_length(FieldName::Title, raw, TITLE_MAX_CHARS)
}

pub fn validate_description(raw: &str) -> Result<Value, ValidationError> {
    check_length(FieldName::Description, raw, DESCRIPTION_MAX_CHARS)
}

/// Parse a positive price. Stored with two decimal places.
pub fn validate_price(raw: &str) -> Result<Value, ValidationError> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ValidationError::new(FieldName::Price, ValidationReason::NotANumber))?;

    // The stored (rounded) amount must exceed the minimum.
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount <= min_price() {
        return Err(ValidationError::new(
            FieldName::Price,
            ValidationReason::PriceTooLow,
        ));
    }

    Ok(Value::Money(Money::new(amount)))
}

/// Normalize a phone number, with or without the leading `+`.
///
/// The input is first read as an international number. If that fails and a
/// default region is configured, it is read as a national number of that
/// region, so `0991234567` becomes `+380991234567` for Ukraine.
pub fn validate_phone(
    raw: &str,
    default_region: Option<country::Id>,
) -> Result<Phone, ValidationError> {
    let number = parse_phone(raw, default_region)
        .ok_or_else(|| ValidationError::new(FieldName::Contact, ValidationReason::InvalidPhone))?;

    Ok(Phone {
        e164: number.format().mode(Mode::E164).to_string(),
        international: number.format().mode(Mode::International).to_string(),
    })
}

fn parse_phone(raw: &str, default_region: Option<country::Id>) -> Option<PhoneNumber> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let international = if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    };

    // is_valid also rejects numbers whose length is impossible for the region
    if let Ok(number) = phonenumber::parse(None, &international) {
        if phonenumber::is_valid(&number) {
            return Some(number);
        }
    }

    if trimmed.starts_with('+') {
        return None;
    }

    let region = default_region?;
    phonenumber::parse(Some(region), trimmed)
        .ok()
        .filter(phonenumber::is_valid)
}

/// Accept a media attachment as a photo.
pub fn validate_photo(content: &MediaContent) -> Result<PhotoRef, ValidationError> {
    match content {
        MediaContent::Photo { file_id } => Ok(PhotoRef::new(file_id.clone())),
        _ => Err(ValidationError::new(
            FieldName::Photo,
            ValidationReason::NotAnImage,
        )),
    }
}

/// Reject an append once the collection is full.
pub fn check_photo_capacity(current: usize) -> Result<(), ValidationError> {
    if current >= MAX_PHOTOS {
        return Err(ValidationError::new(
            FieldName::Photo,
            ValidationReason::PhotoLimitReached { max: MAX_PHOTOS },
        ));
    }
    Ok(())
}

/// Resolve a tag button id.
pub fn validate_tag(id: &str) -> Result<TagCategory, ValidationError> {
    TagCategory::from_id(id).ok_or_else(|| {
        ValidationError::new(FieldName::Tags, ValidationReason::UnknownTag(id.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(value: Value) -> Money {
        match value {
            Value::Money(m) => m,
            other => panic!("expected money, got {other:?}"),
        }
    }

    #[test]
    fn title_length_limit_counts_characters() {
        assert!(validate_title("Bike").is_ok());
        assert!(validate_title(&"я".repeat(64)).is_ok());

        let err = validate_title(&"я".repeat(65)).unwrap_err();
        assert_eq!(err.field, FieldName::Title);
        assert_eq!(err.reason, ValidationReason::TooLong { max: 64 });
    }

    #[test]
    fn description_length_limit() {
        assert!(validate_description(&"a".repeat(1024)).is_ok());
        let err = validate_description(&"a".repeat(2000)).unwrap_err();
        assert_eq!(err.field, FieldName::Description);
        assert!(err.message().contains("1024"));
    }

    #[test]
    fn price_rejects_non_numeric_and_too_small() {
        for raw in ["abc", "", "12,5", "ten"] {
            let err = validate_price(raw).unwrap_err();
            assert_eq!(err.reason, ValidationReason::NotANumber, "input {raw:?}");
        }
        for raw in ["0", "0.01", "-5", "0.001", "0.011", "0.014"] {
            let err = validate_price(raw).unwrap_err();
            assert_eq!(err.reason, ValidationReason::PriceTooLow, "input {raw:?}");
        }
    }

    #[test]
    fn price_just_above_minimum_is_stored_above_minimum() {
        for raw in ["0.015", "0.02", "0.0199"] {
            let stored = money(validate_price(raw).unwrap()).amount;
            assert!(stored > min_price(), "input {raw:?} stored as {stored}");
            // What was stored must pass validation again unchanged
            let again = money(validate_price(&stored.to_string()).unwrap()).amount;
            assert_eq!(again, stored);
        }
    }

    #[test]
    fn price_accepts_positive_and_normalizes_to_cents() {
        let ten = money(validate_price("10").unwrap());
        let ten_cents = money(validate_price("10.00").unwrap());
        assert_eq!(ten.amount, ten_cents.amount);
        assert_eq!(ten.display_amount(), "10");

        assert_eq!(money(validate_price(" 15.5 ").unwrap()).display_amount(), "15.5");
        assert_eq!(money(validate_price("0.02").unwrap()).amount, dec!(0.02));
        assert_eq!(money(validate_price("1.005").unwrap()).amount, dec!(1.01));
        assert_eq!(money(validate_price("1e3").unwrap()).amount, dec!(1000));
    }

    #[test]
    fn phone_accepts_with_and_without_plus() {
        let with_plus = validate_phone("+380991234567", None).unwrap();
        let without_plus = validate_phone("380991234567", None).unwrap();
        assert_eq!(with_plus, without_plus);
        assert_eq!(with_plus.e164, "+380991234567");
        assert!(with_plus.international.starts_with("+380"));
    }

    #[test]
    fn phone_national_format_uses_default_region() {
        let phone = validate_phone("0991234567", Some(country::Id::UA)).unwrap();
        assert_eq!(phone.e164, "+380991234567");

        assert!(validate_phone("0991234567", None).is_err());
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        let first = validate_phone("0991234567", Some(country::Id::UA)).unwrap();
        let again = validate_phone(&first.e164, Some(country::Id::UA)).unwrap();
        assert_eq!(first, again);
        let from_display = validate_phone(&first.international, Some(country::Id::UA)).unwrap();
        assert_eq!(first, from_display);
    }

    #[test]
    fn phone_rejects_gibberish_and_invalid_numbers() {
        for raw in ["", "hello", "+1 123", "12"] {
            let err = validate_phone(raw, Some(country::Id::UA)).unwrap_err();
            assert_eq!(err.field, FieldName::Contact, "input {raw:?}");
            assert_eq!(err.reason, ValidationReason::InvalidPhone);
        }
    }

    #[test]
    fn registry_dispatches_by_field() {
        let validators = Validators::default();
        assert_eq!(
            validators.validate_text(FieldName::Title, "Bike").unwrap(),
            Value::Text("Bike".into())
        );
        assert!(matches!(
            validators.validate_text(FieldName::Price, "15.5"),
            Ok(Value::Money(_))
        ));
        assert!(matches!(
            validators.validate_text(FieldName::Contact, "0991234567"),
            Ok(Value::Phone(_))
        ));
        assert_eq!(
            validators.validate_text(FieldName::Photo, "text").unwrap_err().reason,
            ValidationReason::NotAnImage
        );
        assert_eq!(
            validators.validate_text(FieldName::Tags, "sport").unwrap_err().reason,
            ValidationReason::ExpectedSelection
        );
    }

    #[test]
    fn photo_requires_image_content() {
        let photo = MediaContent::Photo {
            file_id: "AgAD1".into(),
        };
        assert_eq!(validate_photo(&photo).unwrap(), PhotoRef::new("AgAD1"));

        let doc = MediaContent::Other {
            kind: "document".into(),
        };
        assert_eq!(
            validate_photo(&doc).unwrap_err().reason,
            ValidationReason::NotAnImage
        );
    }

    #[test]
    fn photo_capacity() {
        assert!(check_photo_capacity(0).is_ok());
        assert!(check_photo_capacity(MAX_PHOTOS - 1).is_ok());
        assert_eq!(
            check_photo_capacity(MAX_PHOTOS).unwrap_err().reason,
            ValidationReason::PhotoLimitReached { max: MAX_PHOTOS }
        );
    }

    #[test]
    fn tag_ids_resolve() {
        assert_eq!(validate_tag("sport").unwrap(), TagCategory::Sport);
        assert!(matches!(
            validate_tag("cars").unwrap_err().reason,
            ValidationReason::UnknownTag(_)
        ));
    }

    #[test]
    fn every_reason_has_a_message() {
        let reasons = [
            ValidationReason::TooLong { max: 64 },
            ValidationReason::NotANumber,
            ValidationReason::PriceTooLow,
            ValidationReason::InvalidPhone,
            ValidationReason::NotAnImage,
            ValidationReason::PhotoLimitReached { max: 5 },
            ValidationReason::ExpectedText,
            ValidationReason::ExpectedSelection,
            ValidationReason::UnknownTag("x".into()),
            ValidationReason::TagAlreadySet,
        ];
        for reason in reasons {
            let err = ValidationError::new(FieldName::Title, reason);
            assert!(!err.message().is_empty());
        }
    }
}
