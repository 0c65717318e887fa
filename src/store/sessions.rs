//! In-memory session store with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::traits::{SessionKey, SessionStore};
use crate::wizard::{AdKind, FormSession};

/// Sessions keyed by channel and user, held in process memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, FormSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, key: &SessionKey, kind: AdKind) -> FormSession {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(session = %key, kind = kind.as_str(), "Session created");
                FormSession::new(kind)
            })
            .clone()
    }

    async fn get(&self, key: &SessionKey) -> Option<FormSession> {
        self.sessions.read().await.get(key).cloned()
    }

    async fn put(&self, key: &SessionKey, session: FormSession) {
        self.sessions.write().await.insert(key.clone(), session);
    }

    async fn remove(&self, key: &SessionKey) -> Option<FormSession> {
        let removed = self.sessions.write().await.remove(key);
        if removed.is_some() {
            debug!(session = %key, "Session removed");
        }
        removed
    }

    async fn expire_idle(&self, ttl: Duration) -> usize {
        let Some(cutoff) = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at() > cutoff);
        let expired = before - sessions.len();

        if expired > 0 {
            info!(expired, remaining = sessions.len(), "Expired idle sessions");
        }
        expired
    }
}

/// Periodically drop sessions idle for longer than `ttl`.
pub fn spawn_expiry_task(
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.expire_idle(ttl).await;
        }
    })
}
