//! Bot commands recognized outside the wizard.

use crate::channels::MessageContent;
use crate::wizard::AdKind;

/// Parses message content into a [`Command`].
pub struct CommandParser;

impl CommandParser {
    /// Parse message content into a command.
    ///
    /// Only text can be a command; button presses and attachments are
    /// always wizard input.
    pub fn parse(content: &MessageContent) -> Command {
        let MessageContent::Text(text) = content else {
            return Command::Input;
        };

        let trimmed = text.trim();
        // Telegram appends the bot name in group chats: `/sell@adpost_bot`.
        let command = trimmed
            .split_once('@')
            .map_or(trimmed, |(c, _)| c)
            .to_lowercase();

        match command.as_str() {
            "/start" | "/sell" => Command::Start(AdKind::Sell),
            "/buy" => Command::Start(AdKind::Buy),
            "/cancel" => Command::Cancel,
            "/help" | "/?" => Command::Help,
            _ => Command::Input,
        }
    }
}

/// What a message asks the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Discard any session and open a fresh wizard.
    Start(AdKind),
    /// Leave the wizard.
    Cancel,
    Help,
    /// Anything else goes to the active wizard, if there is one.
    Input,
}

impl Command {
    /// Check if this command replaces or ends the session.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Start(_) | Self::Cancel)
    }
}
