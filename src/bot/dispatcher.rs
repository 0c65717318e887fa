//! Dispatcher: routes inbound messages to per-session workers.
//!
//! Each `SessionKey` gets a worker task fed through an mpsc queue, so one
//! session's messages are handled strictly in order while different
//! sessions run concurrently. A worker exits after `worker_idle` without
//! input; the next message for that key spawns a fresh one, which waits
//! for its predecessor to finish before taking input.
//!
//! Handing a message to a worker never waits: when a session's queue is
//! full the message is dropped with a warning, so one flooding session
//! cannot stall the others or the shutdown signal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Bot;
use crate::channels::{ChannelManager, IncomingMessage};
use crate::error::Error;
use crate::store::{SessionKey, spawn_expiry_task};

/// Default queue depth per session worker.
const WORKER_QUEUE: usize = 32;

struct Worker {
    tx: mpsc::Sender<IncomingMessage>,
    handle: JoinHandle<()>,
}

pub struct Dispatcher {
    bot: Arc<Bot>,
    channels: Arc<ChannelManager>,
    workers: HashMap<SessionKey, Worker>,
    session_ttl: Duration,
    worker_idle: Duration,
    queue_capacity: usize,
}

impl Dispatcher {
    pub fn new(bot: Bot, channels: ChannelManager, session_ttl: Duration) -> Self {
        Self {
            bot: Arc::new(bot),
            channels: Arc::new(channels),
            workers: HashMap::new(),
            session_ttl,
            worker_idle: Duration::from_secs(300),
            queue_capacity: WORKER_QUEUE,
        }
    }

    /// How long a worker waits for input before exiting.
    pub fn with_worker_idle(mut self, idle: Duration) -> Self {
        self.worker_idle = idle;
        self
    }

    /// How many messages a session may have waiting before new ones are
    /// dropped. Clamped to at least one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// Messages already queued are handled before this returns.
    pub async fn run(mut self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        // Expire idle sessions at a tenth of the TTL, at least once a minute.
        let every = (self.session_ttl / 10).min(Duration::from_secs(60));
        let expiry_handle = spawn_expiry_task(
            self.bot.sessions().clone(),
            self.session_ttl,
            every.max(Duration::from_secs(1)),
        );

        tracing::info!(
            channels = ?self.channels.names(),
            "Bot ready and listening"
        );

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            self.dispatch(message);
        }

        // Cleanup
        expiry_handle.abort();
        for (_, worker) in self.workers.drain() {
            drop(worker.tx);
            if let Err(e) = worker.handle.await {
                tracing::error!("Session worker panicked: {e}");
            }
        }
        self.channels.shutdown_all().await?;

        Ok(())
    }

    /// Hand `message` to its session's worker, spawning one if needed.
    fn dispatch(&mut self, message: IncomingMessage) {
        let key = message.session_key();

        let (message, previous) = match self.workers.remove(&key) {
            Some(worker) => match worker.tx.try_send(message) {
                Ok(()) => {
                    self.workers.insert(key, worker);
                    return;
                }
                Err(mpsc::error::TrySendError::Full(message)) => {
                    tracing::warn!(
                        user = %key,
                        channel = %message.channel,
                        "Session queue full, dropping message"
                    );
                    self.workers.insert(key, worker);
                    return;
                }
                // The worker went idle and closed its queue.
                Err(mpsc::error::TrySendError::Closed(message)) => {
                    (message, Some(worker.handle))
                }
            },
            None => (message, None),
        };

        self.workers.retain(|_, w| !w.tx.is_closed());

        let worker = self.spawn_worker(key.clone(), previous);
        if worker.tx.try_send(message).is_err() {
            tracing::error!(user = %key, "Fresh session worker refused a message");
        }
        self.workers.insert(key, worker);
    }

    fn spawn_worker(&self, key: SessionKey, previous: Option<JoinHandle<()>>) -> Worker {
        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(self.queue_capacity);
        let bot = self.bot.clone();
        let channels = self.channels.clone();
        let idle = self.worker_idle;

        let handle = tokio::spawn(async move {
            // Keep per-session order across worker generations.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            tracing::debug!(user = %key, "Session worker started");

            loop {
                let message = match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(m)) => m,
                    Ok(None) => break,
                    Err(_) => {
                        // Refuse new input, then finish what is already queued.
                        rx.close();
                        while let Some(m) = rx.recv().await {
                            handle_one(&bot, &channels, &m).await;
                        }
                        break;
                    }
                };
                handle_one(&bot, &channels, &message).await;
            }

            tracing::debug!(user = %key, "Session worker stopped");
        });

        Worker { tx, handle }
    }
}

async fn handle_one(bot: &Bot, channels: &ChannelManager, message: &IncomingMessage) {
    let Some(response) = bot.handle(message).await else {
        return;
    };
    if let Err(e) = channels.respond(message, response).await {
        tracing::error!(
            channel = %message.channel,
            user = %message.user_id,
            "Failed to send response: {e}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use tokio::sync::{Mutex, Semaphore};

    use crate::channels::{Channel, MessageStream, OutgoingResponse};
    use crate::error::ChannelError;
    use crate::store::{InMemorySessionStore, LibSqlAdStore};
    use crate::wizard::Wizard;

    struct ScriptedChannel {
        inbound: Vec<IncomingMessage>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "script"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(stream::iter(self.inbound.clone())))
        }

        async fn respond(
            &self,
            msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .await
                .push((msg.user_id.clone(), response.content.to_plain()));
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    async fn run_script(inbound: Vec<IncomingMessage>, idle: Duration) -> Vec<(String, String)> {
        let channel = Arc::new(ScriptedChannel {
            inbound,
            sent: Mutex::new(Vec::new()),
        });
        let mut channels = ChannelManager::new();
        channels.add(channel.clone());

        let ads = Arc::new(LibSqlAdStore::new_memory().await.unwrap());
        let bot = Bot::new(Wizard::default(), InMemorySessionStore::new(), ads);
        Dispatcher::new(bot, channels, Duration::from_secs(3600))
            .with_worker_idle(idle)
            .run()
            .await
            .unwrap();

        let sent = channel.sent.lock().await.clone();
        sent
    }

    fn msg(user: &str, text: &str) -> IncomingMessage {
        IncomingMessage::text("script", user, text)
    }

    #[tokio::test]
    async fn replies_to_every_message_in_order() {
        let sent = run_script(
            vec![msg("a", "/sell"), msg("a", "Bike"), msg("a", "Nice bike")],
            Duration::from_secs(60),
        )
        .await;

        assert_eq!(sent.len(), 3);
        assert!(sent[0].1.contains("[Заголовок товара или услуг]"));
        assert!(sent[1].1.contains("[Описание товара или услуг]"));
        assert!(sent[2].1.contains("[Цена]"));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let sent = run_script(
            vec![
                msg("a", "/sell"),
                msg("b", "hello"),
                msg("a", "Bike"),
                msg("b", "/buy"),
            ],
            Duration::from_secs(60),
        )
        .await;

        let for_b: Vec<&str> = sent
            .iter()
            .filter(|(u, _)| u == "b")
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(for_b.len(), 2);
        assert_eq!(for_b[0], crate::bot::NO_SESSION_HINT);
        assert!(for_b[1].contains("#куплю"));

        let for_a = sent.iter().filter(|(u, _)| u == "a").count();
        assert_eq!(for_a, 2);
    }

    #[tokio::test]
    async fn idle_worker_is_respawned_without_losing_state() {
        let channel = Arc::new(ScriptedChannel {
            inbound: Vec::new(),
            sent: Mutex::new(Vec::new()),
        });
        let mut channels = ChannelManager::new();
        channels.add(channel.clone());
        let ads = Arc::new(LibSqlAdStore::new_memory().await.unwrap());
        let bot = Bot::new(Wizard::default(), InMemorySessionStore::new(), ads);
        let mut dispatcher = Dispatcher::new(bot, channels, Duration::from_secs(3600))
            .with_worker_idle(Duration::from_millis(20));

        dispatcher.dispatch(msg("a", "/sell"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(dispatcher.workers[&SessionKey::new("script", "a")].tx.is_closed());

        dispatcher.dispatch(msg("a", "Bike"));
        let worker = dispatcher.workers.remove(&SessionKey::new("script", "a")).unwrap();
        drop(worker.tx);
        worker.handle.await.unwrap();

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.contains("1. Заголовок товара или услуг: Bike"));
    }

    /// Replies to user "a" wait until the gate is opened.
    struct GatedChannel {
        gate: Semaphore,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for GatedChannel {
        fn name(&self) -> &str {
            "script"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(stream::empty()))
        }

        async fn respond(
            &self,
            msg: &IncomingMessage,
            _response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            if msg.user_id == "a" {
                let _permit = self.gate.acquire().await.unwrap();
            }
            self.sent.lock().await.push(msg.user_id.clone());
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn full_queue_does_not_hold_up_other_sessions() {
        let channel = Arc::new(GatedChannel {
            gate: Semaphore::new(0),
            sent: Mutex::new(Vec::new()),
        });
        let mut channels = ChannelManager::new();
        channels.add(channel.clone());
        let ads = Arc::new(LibSqlAdStore::new_memory().await.unwrap());
        let bot = Bot::new(Wizard::default(), InMemorySessionStore::new(), ads);
        let mut dispatcher = Dispatcher::new(bot, channels, Duration::from_secs(3600))
            .with_queue_capacity(1);

        // "a" floods while its worker is stuck replying
        for _ in 0..10 {
            dispatcher.dispatch(msg("a", "/sell"));
        }
        dispatcher.dispatch(msg("b", "hello"));

        tokio::time::timeout(Duration::from_secs(5), async {
            while !channel.sent.lock().await.iter().any(|u| u == "b") {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("reply to b was held up by a");
        assert!(!channel.sent.lock().await.iter().any(|u| u == "a"));

        channel.gate.add_permits(10);
        for (_, worker) in dispatcher.workers.drain() {
            drop(worker.tx);
            worker.handle.await.unwrap();
        }

        // Overflow was dropped, not queued
        let for_a = channel.sent.lock().await.iter().filter(|u| *u == "a").count();
        assert!((1..=2).contains(&for_a), "{for_a}");
    }
}
