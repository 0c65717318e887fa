//! Inline keyboard layout for the active page.

use super::choice::{Currency, TagCategory};
use super::event::Action;
use super::field::FieldName;
use super::session::FormSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of buttons, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.buttons().any(|b| b.action == action)
    }
}

const TAG_BUTTONS_PER_ROW: usize = 2;

/// Build the keyboard for the session's active field.
///
/// Choice rows appear only on the pages that honour them: currency and
/// negotiability on price, tag selection or deletion on tags. The done
/// page is final and has no buttons.
pub fn keyboard(session: &FormSession) -> Keyboard {
    if session.current_field() == FieldName::Done {
        return Keyboard::default();
    }

    let mut rows = Vec::new();

    match session.current_field() {
        FieldName::Price => {
            rows.push(vec![negotiable_button(session.negotiable())]);
            rows.push(
                Currency::ALL
                    .into_iter()
                    .map(|c| currency_button(c, c == session.currency()))
                    .collect(),
            );
        }
        FieldName::Tags => match session.tag() {
            Some(tag) => rows.push(vec![Button::new(
                format!("❌ Удалить #{}", tag.hashtag()),
                Action::DeleteTag,
            )]),
            None => {
                for chunk in TagCategory::ALL.chunks(TAG_BUTTONS_PER_ROW) {
                    rows.push(
                        chunk
                            .iter()
                            .map(|t| Button::new(t.button_label(), Action::SelectTag(*t)))
                            .collect(),
                    );
                }
            }
        },
        _ => {}
    }

    rows.push(vec![
        Button::new("<<", Action::Left),
        Button::new(session.current_field().section(), Action::Page),
        Button::new(">>", Action::Right),
    ]);
    rows.push(vec![
        Button::new("🔚 Назад", Action::Exit),
        Button::new("👁 Предпросмотр", Action::Preview),
        Button::new("Готово", Action::Done),
    ]);

    Keyboard { rows }
}

fn negotiable_button(negotiable: bool) -> Button {
    let label = if negotiable {
        "Торг уместен: Да ✅"
    } else {
        "Торг уместен: Нет ❌"
    };
    Button::new(label, Action::ToggleNegotiable)
}

fn currency_button(currency: Currency, selected: bool) -> Button {
    let label = if selected {
        format!("✔️ {}", currency.symbol())
    } else {
        currency.symbol().to_string()
    };
    Button::new(label, Action::SelectCurrency(currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::choice;
    use crate::wizard::navigation::{self, NavAction};

    fn on(field: FieldName) -> FormSession {
        let mut session = FormSession::default();
        navigation::navigate(&mut session, NavAction::SwitchTo(field));
        session
    }

    #[test]
    fn title_page_has_navigation_only() {
        let kb = keyboard(&FormSession::default());
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[0][1].label, "Заголовок");
        assert!(kb.contains(Action::Left));
        assert!(kb.contains(Action::Done));
        assert!(!kb.contains(Action::ToggleNegotiable));
    }

    #[test]
    fn price_page_marks_selected_currency() {
        let mut session = on(FieldName::Price);
        let kb = keyboard(&session);
        assert_eq!(kb.rows[0][0].label, "Торг уместен: Нет ❌");
        let currencies: Vec<&str> = kb.rows[1].iter().map(|b| b.label.as_str()).collect();
        assert_eq!(currencies, vec!["$", "€", "₽", "✔️ ₴"]);

        choice::select_currency(&mut session, Currency::Eur);
        choice::toggle_negotiable(&mut session);
        let kb = keyboard(&session);
        assert_eq!(kb.rows[0][0].label, "Торг уместен: Да ✅");
        assert_eq!(kb.rows[1][1].label, "✔️ €");
    }

    #[test]
    fn tags_page_offers_ten_tags_until_one_is_set() {
        let mut session = on(FieldName::Tags);
        let kb = keyboard(&session);
        let tags = kb
            .buttons()
            .filter(|b| matches!(b.action, Action::SelectTag(_)))
            .count();
        assert_eq!(tags, 10);
        assert!(!kb.contains(Action::DeleteTag));

        choice::select_tag(&mut session, TagCategory::Sport).unwrap();
        let kb = keyboard(&session);
        assert!(kb.contains(Action::DeleteTag));
        assert!(!kb.buttons().any(|b| matches!(b.action, Action::SelectTag(_))));
        assert_eq!(kb.rows[0][0].label, "❌ Удалить #спорт");
    }

    #[test]
    fn done_page_has_no_buttons() {
        assert!(keyboard(&on(FieldName::Done)).rows.is_empty());
        assert_eq!(keyboard(&on(FieldName::Preview)).rows.len(), 2);
    }
}
