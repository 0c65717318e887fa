//! Integration tests for the dispatcher, bot and ad store together.
//!
//! A scripted channel replays a conversation; the dispatcher runs until the
//! script ends and every queued reply has been sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use adpost::bot::{Bot, Dispatcher};
use adpost::channels::{
    Channel, ChannelManager, IncomingMessage, MessageContent, MessageStream, OutgoingResponse,
};
use adpost::error::ChannelError;
use adpost::store::{AdStore, InMemorySessionStore, LibSqlAdStore, SessionKey};
use adpost::wizard::{Action, Currency, MediaContent, TagCategory, Wizard};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

struct ScriptedChannel {
    name: &'static str,
    inbound: Vec<IncomingMessage>,
    sent: Mutex<Vec<(String, OutgoingResponse)>>,
}

impl ScriptedChannel {
    fn new(name: &'static str, inbound: Vec<IncomingMessage>) -> Arc<Self> {
        Arc::new(Self {
            name,
            inbound,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        self.name
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        Ok(Box::pin(stream::iter(self.inbound.clone())))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.sent.lock().await.push((msg.user_id.clone(), response));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

struct Script {
    channel: &'static str,
    user: &'static str,
    messages: Vec<IncomingMessage>,
}

impl Script {
    fn new(channel: &'static str, user: &'static str) -> Self {
        Self {
            channel,
            user,
            messages: Vec::new(),
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.messages
            .push(IncomingMessage::text(self.channel, self.user, text));
        self
    }

    fn press(mut self, action: Action) -> Self {
        self.messages.push(IncomingMessage::new(
            self.channel,
            self.user,
            MessageContent::Callback {
                id: format!("cb{}", self.messages.len()),
                data: action.callback_data(),
            },
        ));
        self
    }

    fn media(mut self, media: MediaContent) -> Self {
        self.messages.push(IncomingMessage::new(
            self.channel,
            self.user,
            MessageContent::Media(media),
        ));
        self
    }
}

async fn run(channels: Vec<Arc<ScriptedChannel>>, ads: Arc<LibSqlAdStore>) {
    let mut manager = ChannelManager::new();
    for channel in channels {
        manager.add(channel);
    }
    let bot = Bot::new(Wizard::default(), InMemorySessionStore::new(), ads);
    let dispatcher = Dispatcher::new(bot, manager, Duration::from_secs(3600));
    timeout(TEST_TIMEOUT, dispatcher.run())
        .await
        .expect("dispatcher hung")
        .expect("dispatcher failed");
}

#[tokio::test]
async fn full_conversation_persists_ad() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ads.db");

    let script = Script::new("telegram", "42")
        .text("/sell")
        .text("Bike")
        .text(&"x".repeat(2000))
        .text("Light city bike, recently serviced, new tyres.")
        .text("15.5")
        .text("0991234567")
        .media(MediaContent::Photo {
            file_id: "AgACAgIAAxkBAAIB".into(),
        })
        .press(Action::Right)
        .press(Action::SelectTag(TagCategory::Sport))
        .press(Action::Right)
        .press(Action::Done);
    let expected_replies = script.messages.len();
    let channel = ScriptedChannel::new("telegram", script.messages);

    let ads = Arc::new(LibSqlAdStore::new_local(&db_path).await.unwrap());
    run(vec![channel.clone()], ads).await;

    let sent = channel.sent.lock().await;
    assert_eq!(sent.len(), expected_replies);

    let rejected = sent[2].1.content.to_plain();
    assert!(rejected.starts_with("⚠️"), "{rejected}");

    let preview = sent[9].1.content.to_plain();
    assert!(preview.contains("15.5 ₴ (цена окончательна)"), "{preview}");
    assert!(preview.contains("#продам, #спорт"), "{preview}");

    let done = &sent[10].1;
    assert!(done.content.to_plain().contains("Объявление отправлено"));
    assert!(done.keyboard.rows.is_empty());
    drop(sent);

    // Reopen the file: the ad survived the process
    let reopened = LibSqlAdStore::new_local(&db_path).await.unwrap();
    let owner = SessionKey::new("telegram", "42");
    let stored = reopened.list_ads_by_user(&owner, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    let ad = &stored[0].ad;
    assert_eq!(ad.title, "Bike");
    assert_eq!(ad.currency, Currency::Uah);
    assert_eq!(ad.contact, "+380991234567");
    assert_eq!(ad.tag, Some(TagCategory::Sport));
    assert_eq!(ad.photos.len(), 1);
    assert_eq!(
        reopened.get_ad(ad.id).await.unwrap().map(|s| s.owner),
        Some(owner)
    );
}

#[tokio::test]
async fn users_on_different_channels_do_not_share_sessions() {
    let ads = Arc::new(LibSqlAdStore::new_memory().await.unwrap());

    let telegram = ScriptedChannel::new(
        "telegram",
        Script::new("telegram", "7")
            .text("/sell")
            .text("Telegram bike")
            .messages,
    );
    // Same user id on another channel is another session
    let cli = ScriptedChannel::new(
        "cli",
        Script::new("cli", "7").text("Lamp").text("/buy").messages,
    );

    run(vec![telegram.clone(), cli.clone()], ads).await;

    let cli_sent = cli.sent.lock().await;
    assert_eq!(cli_sent.len(), 2);
    assert_eq!(
        cli_sent[0].1.content.to_plain(),
        adpost::bot::NO_SESSION_HINT
    );
    assert!(cli_sent[1].1.content.to_plain().contains("#куплю"));

    let telegram_sent = telegram.sent.lock().await;
    assert_eq!(telegram_sent.len(), 2);
    assert!(
        telegram_sent[1]
            .1
            .content
            .to_plain()
            .contains("Telegram bike")
    );
}

#[tokio::test]
async fn exit_discards_the_draft() {
    let ads = Arc::new(LibSqlAdStore::new_memory().await.unwrap());
    let channel = ScriptedChannel::new(
        "telegram",
        Script::new("telegram", "9")
            .text("/sell")
            .text("Chair")
            .press(Action::Exit)
            .text("Table")
            .messages,
    );

    run(vec![channel.clone()], ads.clone()).await;

    let sent = channel.sent.lock().await;
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[2].1.content.to_plain(), adpost::bot::EXIT_TEXT);
    assert_eq!(sent[3].1.content.to_plain(), adpost::bot::NO_SESSION_HINT);

    let owner = SessionKey::new("telegram", "9");
    assert_eq!(ads.count_ads_by_user(&owner).await.unwrap(), 0);
}
