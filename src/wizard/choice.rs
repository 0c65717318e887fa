//! Fixed choice sets: tag categories, currencies, and the ad kind.
//!
//! These are data exposed to the keyboard layer; the engine only relies on
//! them being closed enumerations.

use serde::{Deserialize, Serialize};

use super::field::FieldName;
use super::session::FormSession;
use super::validate::{ValidationError, ValidationReason};

/// Classification tag chosen on the tags page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    ChildsWorld,
    RealEstate,
    Transport,
    Work,
    Animals,
    HouseGarden,
    Electronics,
    Services,
    FashionStyle,
    Sport,
}

impl TagCategory {
    pub const ALL: [TagCategory; 10] = [
        Self::ChildsWorld,
        Self::RealEstate,
        Self::Transport,
        Self::Work,
        Self::Animals,
        Self::HouseGarden,
        Self::Electronics,
        Self::Services,
        Self::FashionStyle,
        Self::Sport,
    ];

    /// Stable identifier used in button callback data and storage.
    pub fn id(&self) -> &'static str {
        match self {
            Self::ChildsWorld => "childs_world",
            Self::RealEstate => "real_estate",
            Self::Transport => "transport",
            Self::Work => "work",
            Self::Animals => "animals",
            Self::HouseGarden => "house_garden",
            Self::Electronics => "electronics",
            Self::Services => "services",
            Self::FashionStyle => "fashion_style",
            Self::Sport => "sport",
        }
    }

    /// Hashtag body (without `#`) appended to the published ad.
    pub fn hashtag(&self) -> &'static str {
        match self {
            Self::ChildsWorld => "детский_мир",
            Self::RealEstate => "недвижимость",
            Self::Transport => "транспорт",
            Self::Work => "работа",
            Self::Animals => "животные",
            Self::HouseGarden => "дом_и_сад",
            Self::Electronics => "электроника",
            Self::Services => "услуги",
            Self::FashionStyle => "мода_и_стиль",
            Self::Sport => "спорт",
        }
    }

    /// Button caption.
    pub fn button_label(&self) -> &'static str {
        match self {
            Self::ChildsWorld => "#️⃣Детский мир",
            Self::RealEstate => "#️⃣Недвижимость",
            Self::Transport => "#️⃣Транспорт",
            Self::Work => "#️⃣Работа",
            Self::Animals => "#️⃣Животные",
            Self::HouseGarden => "#️⃣Дом и сад",
            Self::Electronics => "#️⃣Электроника",
            Self::Services => "#️⃣Услуги",
            Self::FashionStyle => "#️⃣Мода и стиль",
            Self::Sport => "#️⃣Спорт",
        }
    }

    /// Look a category up by its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

/// Currency of the asking price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Rub,
    #[default]
    Uah,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Self::Usd, Self::Eur, Self::Rub, Self::Uah];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Rub => "RUB",
            Self::Uah => "UAH",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Rub => "₽",
            Self::Uah => "₴",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Whether the user is selling or looking to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdKind {
    #[default]
    Sell,
    Buy,
}

impl AdKind {
    /// Fixed category hashtag, including the leading `#`.
    pub fn hashtag(&self) -> &'static str {
        match self {
            Self::Sell => "#продам",
            Self::Buy => "#куплю",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sell => "sell",
            Self::Buy => "buy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sell" => Some(Self::Sell),
            "buy" => Some(Self::Buy),
            _ => None,
        }
    }
}

/// Compose the tag line: the kind hashtag, plus the chosen tag if any.
pub fn make_tags(kind: AdKind, tag: Option<TagCategory>) -> String {
    match tag {
        Some(tag) => format!("{}, #{}", kind.hashtag(), tag.hashtag()),
        None => kind.hashtag().to_string(),
    }
}

/// Annotation appended to the price line.
pub fn negotiable_note(negotiable: bool) -> &'static str {
    if negotiable {
        "(торг уместен)"
    } else {
        "(цена окончательна)"
    }
}

/// Set the tag. A second selection while one is set is rejected; the
/// current tag must be deleted first.
pub fn select_tag(session: &mut FormSession, tag: TagCategory) -> Result<(), ValidationError> {
    if session.tag().is_some() {
        return Err(ValidationError::new(
            FieldName::Tags,
            ValidationReason::TagAlreadySet,
        ));
    }
    session.set_tag(tag);
    Ok(())
}

/// Clear the tag. Returns the removed tag, if any.
pub fn delete_tag(session: &mut FormSession) -> Option<TagCategory> {
    session.clear_tag()
}

pub fn select_currency(session: &mut FormSession, currency: Currency) {
    session.set_currency(currency);
}

/// Flip negotiability; returns the new value.
pub fn toggle_negotiable(session: &mut FormSession) -> bool {
    session.toggle_negotiable()
}
