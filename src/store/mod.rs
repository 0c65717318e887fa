//! Persistence: in-memory wizard sessions and libSQL-backed ads.

pub mod libsql_backend;
pub mod migrations;
pub mod sessions;
pub mod traits;

pub use libsql_backend::LibSqlAdStore;
pub use sessions::{InMemorySessionStore, spawn_expiry_task};
pub use traits::{AdStore, SessionKey, SessionStore, StoredAd};
