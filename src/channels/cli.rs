//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Keyboard buttons are pressed with slash commands (`/next`, `/tag sport`,
//! `/currency USD`) and attachments are simulated with `/photo`, `/contact`
//! and `/file`.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageContent, MessageStream, OutgoingResponse};
use crate::error::ChannelError;
use crate::wizard::{Action, Keyboard, MediaContent};

const CLI_USER: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprintln!("Type /sell to start. Buttons are shown as [label] /command.");
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", CLI_USER, parse_line(line));
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}", response.content.to_plain());
        let buttons = format_keyboard(&response.keyboard);
        if !buttons.is_empty() {
            println!("\n{buttons}");
        }
        println!();
        eprint!("> ");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Map one input line to message content.
///
/// Button commands become callbacks carrying the same data an inline button
/// would. Bot commands such as `/sell` and anything unrecognized stay text.
pub fn parse_line(line: &str) -> MessageContent {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    let callback = |data: String| MessageContent::Callback {
        id: "cli".to_string(),
        data,
    };

    match (command, arg) {
        ("/next", "") => callback(Action::Right.callback_data()),
        ("/back", "") => callback(Action::Left.callback_data()),
        ("/page", "") => callback(Action::Page.callback_data()),
        ("/preview", "") => callback(Action::Preview.callback_data()),
        ("/done", "") => callback(Action::Done.callback_data()),
        ("/exit", "") => callback(Action::Exit.callback_data()),
        ("/deltag", "") => callback(Action::DeleteTag.callback_data()),
        ("/negotiable", "") => callback(Action::ToggleNegotiable.callback_data()),
        ("/tag", id) if !id.is_empty() => callback(format!("tag:{id}")),
        ("/currency", code) if !code.is_empty() => {
            callback(format!("currency:{}", code.to_uppercase()))
        }
        ("/photo", file_id) if !file_id.is_empty() => MessageContent::Media(MediaContent::Photo {
            file_id: file_id.to_string(),
        }),
        ("/contact", phone) if !phone.is_empty() => {
            MessageContent::Media(MediaContent::Contact {
                phone_number: phone.to_string(),
            })
        }
        ("/file", kind) => MessageContent::Media(MediaContent::Other {
            kind: if kind.is_empty() { "document" } else { kind }.to_string(),
        }),
        _ => MessageContent::Text(line.to_string()),
    }
}

/// The command that presses `action`.
fn command_for(action: &Action) -> String {
    match action {
        Action::Left => "/back".into(),
        Action::Right => "/next".into(),
        Action::Page => "/page".into(),
        Action::Preview => "/preview".into(),
        Action::Done => "/done".into(),
        Action::Exit => "/exit".into(),
        Action::SelectTag(tag) => format!("/tag {}", tag.id()),
        Action::DeleteTag => "/deltag".into(),
        Action::SelectCurrency(currency) => format!("/currency {}", currency.code()),
        Action::ToggleNegotiable => "/negotiable".into(),
    }
}

/// One line per keyboard row.
fn format_keyboard(keyboard: &Keyboard) -> String {
    keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| format!("[{}] {}", b.label, command_for(&b.action)))
                .collect::<Vec<_>>()
                .join("   ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
