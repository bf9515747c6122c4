//! Credential Storage
//! Mission: Durably map usernames to ids and password verifiers with SQLite

use crate::auth::models::Account;
use crate::error::StoreError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Account repository consumed by the identity authority.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new account. A taken username surfaces as `StoreError::Conflict`.
    async fn create(&self, username: &str, password_hash: &str) -> Result<Account, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>>;
}

/// Credential store with SQLite backend
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCredentialStore {
    /// Open (or create) the database and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open auth db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(3)?;
        Ok(Account {
            id: Uuid::parse_str(&id).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
            })?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create(&self, username: &str, password_hash: &str) -> Result<Account, StoreError> {
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO accounts (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.id.to_string(),
                account.username,
                account.password_hash,
                account.created_at.to_rfc3339(),
            ],
        )?;

        info!("✅ Stored account: {} ({})", account.username, account.id);

        Ok(account)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, username, password_hash, created_at
             FROM accounts WHERE username = ?1",
        )?;

        stmt.query_row(params![username], Self::row_to_account)
            .optional()
            .context("Failed to look up account by username")
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, username, password_hash, created_at
             FROM accounts WHERE id = ?1",
        )?;

        stmt.query_row(params![id.to_string()], Self::row_to_account)
            .optional()
            .context("Failed to look up account by id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (SqliteCredentialStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = SqliteCredentialStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[tokio::test]
    async fn test_create_and_retrieve_account() {
        let (store, _temp) = create_test_store();

        let account = store.create("alice", "hash-a").await.unwrap();
        assert_eq!(account.username, "alice");

        let by_name = store.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, account.id);
        assert_eq!(by_name.password_hash, "hash-a");

        let by_id = store.get_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let (store, _temp) = create_test_store();

        let first = store.create("alice", "hash-a").await.unwrap();
        let second = store.create("alice", "hash-b").await;
        assert!(matches!(second, Err(StoreError::Conflict)));

        // The first record is untouched
        let stored = store.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn test_missing_account_is_none() {
        let store = SqliteCredentialStore::in_memory().unwrap();

        assert!(store.get_by_username("nobody").await.unwrap().is_none());
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accounts_survive_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let id = {
            let store = SqliteCredentialStore::new(&db_path).unwrap();
            store.create("carol", "hash-c").await.unwrap().id
        };

        let reopened = SqliteCredentialStore::new(&db_path).unwrap();
        let account = reopened.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.username, "carol");
    }
}
