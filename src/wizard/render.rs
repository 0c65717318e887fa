//! Preview renderer: pure function from session state to display text.
//!
//! The output is a list of styled spans so the same render can be sent to
//! Telegram as HTML or printed on a terminal as plain text.

use super::choice::{make_tags, negotiable_note};
use super::field::FieldName;
use super::photos;
use super::session::FormSession;
use super::validate::ValidationError;

/// Shown in place of an unset value.
pub const PLACEHOLDER: &str = "➖";

/// Text style of one span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Bold,
    Italic,
    Code,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub style: Style,
    pub text: String,
}

/// Rendered prompt text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayText {
    spans: Vec<Span>,
}

impl DisplayText {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, style: Style, text: impl Into<String>) -> &mut Self {
        self.spans.push(Span {
            style,
            text: text.into(),
        });
        self
    }

    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Style::Plain, text)
    }

    pub fn styled(&mut self, style: Style, text: impl Into<String>) -> &mut Self {
        self.push(style, text)
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Telegram HTML parse mode. User-supplied text is escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let text = escape_html(&span.text);
            match span.style {
                Style::Plain => out.push_str(&text),
                Style::Bold => out.push_str(&format!("<b>{text}</b>")),
                Style::Italic => out.push_str(&format!("<i>{text}</i>")),
                Style::Code => out.push_str(&format!("<code>{text}</code>")),
                Style::Underline => out.push_str(&format!("<u>{text}</u>")),
            }
        }
        out
    }

    /// Terminal rendering: the underlined label is bracketed, other styles
    /// are dropped.
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            match span.style {
                Style::Underline => out.push_str(&format!("[{}]", span.text)),
                _ => out.push_str(&span.text),
            }
        }
        out
    }

    /// Length of the visible text in UTF-16 code units, the unit Telegram
    /// counts message limits in. Markup and escapes are not counted.
    pub fn visible_len(&self) -> usize {
        self.spans.iter().map(|s| utf16_len(&s.text)).sum()
    }

    /// Split into pieces whose visible text is at most `max_len` UTF-16
    /// units each (`max_len` must be at least 2).
    ///
    /// Pieces break between spans when a span fits whole in the next piece.
    /// A longer span is cut after a newline, then after a space, then at
    /// any char boundary, and both halves keep its style, so every piece
    /// renders to balanced HTML on its own.
    pub fn split(&self, max_len: usize) -> Vec<DisplayText> {
        let mut pieces = Vec::new();
        let mut current = DisplayText::new();
        let mut used = 0;

        for span in &self.spans {
            let mut rest = span.text.as_str();
            while !rest.is_empty() {
                let room = max_len.saturating_sub(used);
                let len = utf16_len(rest);
                if len <= room {
                    current.push(span.style, rest);
                    used += len;
                    break;
                }
                if used > 0 && len <= max_len {
                    pieces.push(std::mem::take(&mut current));
                    used = 0;
                    continue;
                }

                let mut cut = cut_point(rest, room);
                if cut == 0 {
                    if used > 0 {
                        pieces.push(std::mem::take(&mut current));
                        used = 0;
                        continue;
                    }
                    cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
                }
                current.push(span.style, &rest[..cut]);
                pieces.push(std::mem::take(&mut current));
                used = 0;
                rest = &rest[cut..];
            }
        }

        if !current.spans.is_empty() || pieces.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index to cut `text` at so the head fits in `room` UTF-16 units.
fn cut_point(text: &str, room: usize) -> usize {
    let mut fits = 0;
    let mut used = 0;
    for (i, c) in text.char_indices() {
        used += c.len_utf16();
        if used > room {
            break;
        }
        fits = i + c.len_utf8();
    }

    let head = &text[..fits];
    if let Some(pos) = head.rfind('\n') {
        pos + 1
    } else if let Some(pos) = head.rfind(' ') {
        pos + 1
    } else {
        fits
    }
}

/// Escape the three characters Telegram's HTML mode reserves.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the prompt for the session's active field.
pub fn render(session: &FormSession) -> DisplayText {
    let active = session.current_field();
    let mut text = DisplayText::new();

    let prompt = if session.is_set(active) {
        active.edit_prompt()
    } else {
        active.first_time_prompt()
    };
    text.plain(prompt).plain("\n\n");

    summary(session, &mut text);
    text
}

/// Prefix the rendered prompt with a validation error line.
pub fn render_error(session: &FormSession, error: &ValidationError) -> DisplayText {
    let mut text = DisplayText::new();
    text.styled(Style::Bold, format!("⚠️ {}", error.message()))
        .plain("\n\n");
    text.spans.extend(render(session).spans);
    text
}

/// Render a notice line above the prompt (e.g. missing fields on submit).
pub fn render_notice(session: &FormSession, notice: &str) -> DisplayText {
    let mut text = DisplayText::new();
    text.styled(Style::Bold, notice).plain("\n\n");
    text.spans.extend(render(session).spans);
    text
}

fn summary(session: &FormSession, text: &mut DisplayText) {
    let active = session.current_field();

    for (index, field) in FieldName::SUMMARY.into_iter().enumerate() {
        text.plain(format!("{}. ", index + 1));
        if field == active {
            text.styled(Style::Underline, field.label());
        } else {
            text.plain(field.label());
        }
        text.plain(": ");
        field_value(session, field, text);
        text.plain("\n");
    }
}

fn field_value(session: &FormSession, field: FieldName, text: &mut DisplayText) {
    match field {
        FieldName::Title => {
            text.styled(Style::Bold, session.text(field).unwrap_or(PLACEHOLDER));
        }
        FieldName::Description => {
            text.styled(Style::Italic, session.text(field).unwrap_or(PLACEHOLDER));
        }
        FieldName::Price => match session.price() {
            Some(money) => {
                text.styled(
                    Style::Code,
                    format!(
                        "{} {} {}",
                        money.display_amount(),
                        money.currency.symbol(),
                        negotiable_note(money.negotiable)
                    ),
                );
            }
            None => {
                text.styled(Style::Code, PLACEHOLDER);
            }
        },
        FieldName::Contact => {
            let contact = session
                .contact()
                .map(|phone| phone.international.as_str())
                .unwrap_or(PLACEHOLDER);
            text.styled(Style::Code, contact);
        }
        FieldName::Photo => {
            text.plain(photos::summary(session).unwrap_or_else(|| PLACEHOLDER.to_string()));
        }
        FieldName::Tags => {
            text.plain(make_tags(session.kind(), session.tag()));
        }
        FieldName::Preview | FieldName::Done => unreachable!("{field} is not a summary line"),
    }
}
