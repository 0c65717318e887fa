//! Storage seams: wizard sessions and finalized ads.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::wizard::{AdKind, AdSubmission, FormSession};

/// Identifies one user's conversation on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub channel: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(channel: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.user_id)
    }
}

/// Where wizard sessions live between events.
///
/// Sessions survive until they end or go idle for longer than the TTL;
/// there is no durability beyond that.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session for `key`, creating a fresh one of `kind` if absent.
    async fn get_or_create(&self, key: &SessionKey, kind: AdKind) -> FormSession;

    async fn get(&self, key: &SessionKey) -> Option<FormSession>;

    async fn put(&self, key: &SessionKey, session: FormSession);

    /// Drop the session. Returns it if one existed.
    async fn remove(&self, key: &SessionKey) -> Option<FormSession>;

    /// Drop sessions not updated within `ttl`. Returns how many were dropped.
    async fn expire_idle(&self, ttl: Duration) -> usize;
}

/// A persisted ad with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAd {
    pub owner: SessionKey,
    pub ad: AdSubmission,
}

/// Receives finalized submissions.
#[async_trait]
pub trait AdStore: Send + Sync {
    async fn insert_ad(&self, owner: &SessionKey, ad: &AdSubmission) -> Result<(), DatabaseError>;

    async fn get_ad(&self, id: Uuid) -> Result<Option<StoredAd>, DatabaseError>;

    /// Most recent first, up to `limit`.
    async fn list_ads_by_user(
        &self,
        owner: &SessionKey,
        limit: usize,
    ) -> Result<Vec<StoredAd>, DatabaseError>;

    async fn count_ads_by_user(&self, owner: &SessionKey) -> Result<usize, DatabaseError>;
}
