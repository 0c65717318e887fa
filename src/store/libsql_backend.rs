//! libSQL backend: async `AdStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{AdStore, SessionKey, StoredAd};
use crate::wizard::{AdKind, AdSubmission, Currency, PhotoRef, TagCategory};

/// libSQL ad store.
///
/// Holds a single connection reused for all operations.
pub struct LibSqlAdStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlAdStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::with_database(db).await?;
        info!(path = %path.display(), "Ad database opened");
        Ok(store)
    }

    /// In-memory database, for tests and the CLI.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::with_database(db).await
    }

    async fn with_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("bad timestamp {s:?}: {e}")))
}

fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn bad_column(column: &str, value: &str) -> DatabaseError {
    DatabaseError::Serialization(format!("bad {column} value {value:?}"))
}

/// Map a row to a `StoredAd`. Column order matches `AD_COLUMNS`.
fn row_to_ad(row: &libsql::Row) -> Result<StoredAd, DatabaseError> {
    let get = |i: i32| -> Result<String, DatabaseError> {
        row.get::<String>(i)
            .map_err(|e| DatabaseError::Query(format!("column {i}: {e}")))
    };

    let id_str = get(0)?;
    let channel = get(1)?;
    let user_id = get(2)?;
    let kind_str = get(3)?;
    let title = get(4)?;
    let description = get(5)?;
    let price_str = get(6)?;
    let currency_str = get(7)?;
    let negotiable: i64 = row
        .get(8)
        .map_err(|e| DatabaseError::Query(format!("column 8: {e}")))?;
    let contact = get(9)?;
    let photos_str = get(10)?;
    let tag_str: Option<String> = row.get::<String>(11).ok();
    let created_str = get(12)?;

    let id = Uuid::parse_str(&id_str).map_err(|_| bad_column("id", &id_str))?;
    let kind = AdKind::parse(&kind_str).ok_or_else(|| bad_column("kind", &kind_str))?;
    let price = Decimal::from_str(&price_str).map_err(|_| bad_column("price", &price_str))?;
    let currency =
        Currency::from_code(&currency_str).ok_or_else(|| bad_column("currency", &currency_str))?;
    let photos: Vec<PhotoRef> = serde_json::from_str(&photos_str)
        .map_err(|e| DatabaseError::Serialization(format!("photos: {e}")))?;
    let tag = match tag_str {
        Some(id) => Some(TagCategory::from_id(&id).ok_or_else(|| bad_column("tag", &id))?),
        None => None,
    };

    Ok(StoredAd {
        owner: SessionKey::new(channel, user_id),
        ad: AdSubmission {
            id,
            kind,
            title,
            description,
            price,
            currency,
            negotiable: negotiable != 0,
            contact,
            photos,
            tag,
            created_at: parse_datetime(&created_str)?,
        },
    })
}

const AD_COLUMNS: &str = "id, channel, user_id, kind, title, description, price, currency, negotiable, contact, photos, tag, created_at";

#[async_trait]
impl AdStore for LibSqlAdStore {
    async fn insert_ad(&self, owner: &SessionKey, ad: &AdSubmission) -> Result<(), DatabaseError> {
        let photos = serde_json::to_string(&ad.photos)
            .map_err(|e| DatabaseError::Serialization(format!("photos: {e}")))?;

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO ads ({AD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    ad.id.to_string(),
                    owner.channel.as_str(),
                    owner.user_id.as_str(),
                    ad.kind.as_str(),
                    ad.title.as_str(),
                    ad.description.as_str(),
                    ad.price.to_string(),
                    ad.currency.code(),
                    ad.negotiable as i64,
                    ad.contact.as_str(),
                    photos,
                    opt_text(ad.tag.as_ref().map(|t| t.id())),
                    ad.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_ad: {e}")))?;

        debug!(ad_id = %ad.id, owner = %owner, "Ad inserted into DB");
        Ok(())
    }

    async fn get_ad(&self, id: Uuid) -> Result<Option<StoredAd>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {AD_COLUMNS} FROM ads WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_ad: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_ad(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_ad: {e}"))),
        }
    }

    async fn list_ads_by_user(
        &self,
        owner: &SessionKey,
        limit: usize,
    ) -> Result<Vec<StoredAd>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {AD_COLUMNS} FROM ads WHERE channel = ?1 AND user_id = ?2 \
                     ORDER BY created_at DESC LIMIT ?3"
                ),
                params![owner.channel.as_str(), owner.user_id.as_str(), limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_ads_by_user: {e}")))?;

        let mut ads = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_ads_by_user: {e}")))?
        {
            ads.push(row_to_ad(&row)?);
        }
        Ok(ads)
    }

    async fn count_ads_by_user(&self, owner: &SessionKey) -> Result<usize, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM ads WHERE channel = ?1 AND user_id = ?2",
                params![owner.channel.as_str(), owner.user_id.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_ads_by_user: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("count_ads_by_user: {e}")))?;
                Ok(count as usize)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count_ads_by_user: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn test_db() -> LibSqlAdStore {
        LibSqlAdStore::new_memory().await.unwrap()
    }

    fn owner(user: &str) -> SessionKey {
        SessionKey::new("telegram", user)
    }

    fn make_ad(title: &str) -> AdSubmission {
        AdSubmission {
            id: Uuid::new_v4(),
            kind: AdKind::Sell,
            title: title.to_string(),
            description: "Red bike, barely used".to_string(),
            price: dec!(15.50),
            currency: Currency::Uah,
            negotiable: true,
            contact: "+380991234567".to_string(),
            photos: vec![PhotoRef::new("AgAD1"), PhotoRef::new("AgAD2")],
            tag: Some(TagCategory::Sport),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_by_id() {
        let db = test_db().await;
        let ad = make_ad("Bike");
        db.insert_ad(&owner("42"), &ad).await.unwrap();

        let stored = db.get_ad(ad.id).await.unwrap().unwrap();
        assert_eq!(stored.owner, owner("42"));
        assert_eq!(stored.ad.title, "Bike");
        assert_eq!(stored.ad.price, dec!(15.5));
        assert!(stored.ad.negotiable);
        assert_eq!(stored.ad.photos.len(), 2);
        assert_eq!(stored.ad.tag, Some(TagCategory::Sport));
        assert_eq!(stored.ad.created_at.timestamp(), ad.created_at.timestamp());
    }

    #[tokio::test]
    async fn get_by_id_not_found() {
        let db = test_db().await;
        assert!(db.get_ad(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn untagged_ad_roundtrips_without_tag() {
        let db = test_db().await;
        let mut ad = make_ad("Lamp");
        ad.tag = None;
        ad.photos.clear();
        db.insert_ad(&owner("1"), &ad).await.unwrap();

        let stored = db.get_ad(ad.id).await.unwrap().unwrap();
        assert_eq!(stored.ad.tag, None);
        assert!(stored.ad.photos.is_empty());
    }

    #[tokio::test]
    async fn list_and_count_by_user() {
        let db = test_db().await;
        let mut older = make_ad("Older");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = make_ad("Newer");

        db.insert_ad(&owner("1"), &older).await.unwrap();
        db.insert_ad(&owner("1"), &newer).await.unwrap();
        db.insert_ad(&owner("2"), &make_ad("Other")).await.unwrap();

        assert_eq!(db.count_ads_by_user(&owner("1")).await.unwrap(), 2);
        assert_eq!(db.count_ads_by_user(&owner("3")).await.unwrap(), 0);

        let ads = db.list_ads_by_user(&owner("1"), 10).await.unwrap();
        let titles: Vec<&str> = ads.iter().map(|a| a.ad.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        let limited = db.list_ads_by_user(&owner("1"), 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn local_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ads.db");
        let ad = make_ad("Bike");

        {
            let db = LibSqlAdStore::new_local(&path).await.unwrap();
            db.insert_ad(&owner("42"), &ad).await.unwrap();
        }

        let db = LibSqlAdStore::new_local(&path).await.unwrap();
        assert!(db.get_ad(ad.id).await.unwrap().is_some());
    }
}
