//! Field schema: the ordered, closed set of wizard fields.

use serde::{Deserialize, Serialize};

/// One step of the sell wizard.
///
/// Declaration order is the linear navigation order. `Preview` and `Done`
/// follow the six input fields but are only reached by explicit navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Description,
    Price,
    Contact,
    Photo,
    Tags,
    Preview,
    Done,
}

/// How a field collects its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Free text, validated by the field's validator.
    Text,
    /// Media attachments collected one per message.
    Media,
    /// Button selection only.
    Selection,
    /// No input; display only.
    None,
}

impl FieldName {
    /// All fields in schema order.
    pub const ALL: [FieldName; 8] = [
        Self::Title,
        Self::Description,
        Self::Price,
        Self::Contact,
        Self::Photo,
        Self::Tags,
        Self::Preview,
        Self::Done,
    ];

    /// The six fields shown in the summary, in display order.
    pub const SUMMARY: [FieldName; 6] = [
        Self::Title,
        Self::Description,
        Self::Price,
        Self::Contact,
        Self::Photo,
        Self::Tags,
    ];

    /// Whether this field is part of the title → tags ring.
    pub fn is_linear(&self) -> bool {
        !matches!(self, Self::Preview | Self::Done)
    }

    /// Whether values for this field live in `FormSession::values`.
    pub fn is_value_field(&self) -> bool {
        matches!(
            self,
            Self::Title | Self::Description | Self::Price | Self::Contact
        )
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            Self::Title | Self::Description | Self::Price | Self::Contact => InputKind::Text,
            Self::Photo => InputKind::Media,
            Self::Tags => InputKind::Selection,
            Self::Preview | Self::Done => InputKind::None,
        }
    }

    /// Label used in the six-line summary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Заголовок товара или услуг",
            Self::Description => "Описание товара или услуг",
            Self::Price => "Цена",
            Self::Contact => "Контактные данные",
            Self::Photo => "Фото (опционально)",
            Self::Tags => "Теги",
            Self::Preview => "Предпросмотр",
            Self::Done => "Готово",
        }
    }

    /// Short section name shown on the page indicator button.
    pub fn section(&self) -> &'static str {
        match self {
            Self::Title => "Заголовок",
            Self::Description => "Описание",
            Self::Price => "Цена",
            Self::Contact => "Контакты",
            Self::Photo => "Картинка",
            Self::Tags => "Теги",
            Self::Preview => "Предпросмотр",
            Self::Done => "Готово",
        }
    }

    /// Instruction shown above the summary when the field is still unset.
    pub fn first_time_prompt(&self) -> &'static str {
        match self {
            Self::Title => {
                "🔡 Придумайте, затем введите короткий и привлекающий внимание заголовок \
                 вашего товара или услуг, чтобы заинтересовать потенциальных покупателей:"
            }
            Self::Description => {
                "📝 Введите описание вашего товара или услуг. Пишите понятно и будьте честны. \
                 Так вы избежите повторяющихся вопросов. Добавьте деталей. Так покупателям \
                 будет проще найти ваше объявление:"
            }
            Self::Price => {
                "💸 Введите цену товара или услуг, так же укажите валюту и уместен ли торг:"
            }
            Self::Contact => {
                "📞 Введите номер телефона который будет отображаться в объявлении или \
                 нажмите на кнопку \"Отправить контакт\":"
            }
            Self::Photo => {
                "🖼 Отправьте картинки товара или услуг по одной (этот раздел можно \
                 пропустить).\nP.s. Максимальное количество картинок: 5:"
            }
            Self::Tags => "#️⃣ Выберите тег своего товара или услуг нажав по кнопке ниже:",
            Self::Preview => "👁 Предпросмотр объявления. Проверьте данные перед отправкой:",
            Self::Done => "✅ Объявление отправлено на публикацию:",
        }
    }

    /// Instruction shown above the summary when the field already has a value.
    pub fn edit_prompt(&self) -> &'static str {
        match self {
            Self::Title => {
                "🔡 Чтобы изменить заголовок товара или услуг, просто отправьте новое название."
            }
            Self::Description => {
                "📝 Чтобы изменить описание товара или услуг, просто отправьте новое описание."
            }
            Self::Price => "💸 Чтобы изменить цену товара или услуг, просто отправьте новую цену.",
            Self::Contact => "📞 Чтобы изменить номер телефона, просто отправьте новый номер.",
            Self::Photo => {
                "🖼 Чтобы добавить ещё одну картинку товара или услуг, просто отправьте \
                 новую картинку."
            }
            Self::Tags => {
                "#️⃣ Чтобы изменить тег товара или услуг, сначала удалите текущий тег, \
                 затем установите новый."
            }
            Self::Preview | Self::Done => self.first_time_prompt(),
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Price => "price",
            Self::Contact => "contact",
            Self::Photo => "photo",
            Self::Tags => "tags",
            Self::Preview => "preview",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_order_is_fixed() {
        let mut sorted = FieldName::ALL;
        sorted.sort();
        assert_eq!(sorted, FieldName::ALL);
        assert_eq!(FieldName::ALL[0], FieldName::Title);
        assert_eq!(FieldName::ALL[5], FieldName::Tags);
    }

    #[test]
    fn only_preview_and_done_are_off_the_ring() {
        for field in FieldName::SUMMARY {
            assert!(field.is_linear(), "{field} should be linear");
        }
        assert!(!FieldName::Preview.is_linear());
        assert!(!FieldName::Done.is_linear());
    }

    #[test]
    fn value_fields_are_the_text_inputs() {
        for field in FieldName::ALL {
            assert_eq!(
                field.is_value_field(),
                field.input_kind() == InputKind::Text,
                "mismatch for {field}"
            );
        }
    }

    #[test]
    fn display_matches_serde() {
        for field in FieldName::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(format!("\"{field}\""), json);
        }
    }
}
