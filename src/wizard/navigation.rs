//! Navigation controller: moves the active-field pointer.
//!
//! title → description → price → contact → photo → tags form a ring in the
//! backward direction (`Back` on title lands on tags). Forward from tags
//! leaves the ring for the preview. Preview and done are otherwise only
//! reachable through `SwitchTo`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field::FieldName;
use super::session::{FieldTransition, FormSession};

/// A directional navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    Next,
    Back,
    SwitchTo(FieldName),
}

/// What caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// An explicit navigation button.
    Explicit,
    /// Automatic advance after accepted input.
    Accepted,
}

/// Target of `action` taken from `current`.
pub fn target(current: FieldName, action: NavAction) -> FieldName {
    use FieldName::*;
    match action {
        NavAction::SwitchTo(field) => field,
        NavAction::Next => match current {
            Title => Description,
            Description => Price,
            Price => Contact,
            Contact => Photo,
            Photo => Tags,
            Tags => Preview,
            Preview => Preview,
            Done => Done,
        },
        NavAction::Back => match current {
            Title => Tags,
            Description => Title,
            Price => Description,
            Contact => Price,
            Photo => Contact,
            Tags => Photo,
            Preview | Done => Tags,
        },
    }
}

/// Field to land on after `current` accepted input.
///
/// Tags never advance on selection, and the photo page stays put so more
/// images can be sent; both require an explicit navigation action.
pub fn after_accepted(current: FieldName) -> FieldName {
    match current {
        FieldName::Title | FieldName::Description | FieldName::Price | FieldName::Contact => {
            target(current, NavAction::Next)
        }
        FieldName::Photo | FieldName::Tags | FieldName::Preview | FieldName::Done => current,
    }
}

/// Apply an explicit navigation action to the session.
pub fn navigate(session: &mut FormSession, action: NavAction) -> FieldName {
    let to = target(session.current_field(), action);
    move_to(session, to, TransitionCause::Explicit);
    to
}

/// Advance after accepted input on the active field.
pub fn advance(session: &mut FormSession) -> FieldName {
    let to = after_accepted(session.current_field());
    move_to(session, to, TransitionCause::Accepted);
    to
}

fn move_to(session: &mut FormSession, to: FieldName, cause: TransitionCause) {
    let from = session.current_field();
    if from == to {
        return;
    }
    debug!(from = %from, to = %to, cause = ?cause, "Field transition");
    session.set_current_field(FieldTransition {
        from,
        to,
        cause,
        timestamp: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use FieldName::*;

    #[test]
    fn next_walks_linear_fields_then_preview() {
        let expected = [Description, Price, Contact, Photo, Tags, Preview];
        let mut current = Title;
        for want in expected {
            current = target(current, NavAction::Next);
            assert_eq!(current, want);
        }
        assert_eq!(target(Preview, NavAction::Next), Preview);
        assert_eq!(target(Done, NavAction::Next), Done);
    }

    #[test]
    fn back_from_title_wraps_to_tags() {
        assert_eq!(target(Title, NavAction::Back), Tags);
        assert_eq!(target(Tags, NavAction::Back), Photo);
        assert_eq!(target(Description, NavAction::Back), Title);
    }

    #[test]
    fn back_walks_the_full_ring() {
        let mut current = Title;
        let mut seen = Vec::new();
        for _ in 0..6 {
            current = target(current, NavAction::Back);
            seen.push(current);
        }
        assert_eq!(seen, vec![Tags, Photo, Contact, Price, Description, Title]);
    }

    #[test]
    fn back_from_terminal_pages_returns_to_tags() {
        assert_eq!(target(Preview, NavAction::Back), Tags);
        assert_eq!(target(Done, NavAction::Back), Tags);
    }

    #[test]
    fn switch_ignores_order() {
        for from in FieldName::ALL {
            for to in FieldName::ALL {
                assert_eq!(target(from, NavAction::SwitchTo(to)), to);
            }
        }
    }

    #[test]
    fn accepted_input_advances_text_fields_only() {
        assert_eq!(after_accepted(Title), Description);
        assert_eq!(after_accepted(Description), Price);
        assert_eq!(after_accepted(Price), Contact);
        assert_eq!(after_accepted(Contact), Photo);
        assert_eq!(after_accepted(Photo), Photo);
        assert_eq!(after_accepted(Tags), Tags);
    }

    #[test]
    fn navigate_records_history() {
        let mut session = FormSession::default();
        navigate(&mut session, NavAction::Back);
        assert_eq!(session.current_field(), Tags);
        advance(&mut session);
        assert_eq!(session.current_field(), Tags);

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from, Title);
        assert_eq!(history[0].to, Tags);
        assert_eq!(history[0].cause, TransitionCause::Explicit);
    }
}
