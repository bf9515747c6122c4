//! Call Storage
//! Mission: Persist call records in SQLite, keyed by id and indexed by owner

use crate::calls::models::{Call, CallStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Resource repository consumed by the call service.
///
/// Each method is a single-row operation; no multi-row transactions.
/// `update_status` and `delete` return whether a row was affected.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn create(&self, call: &Call) -> Result<()>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Call>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Call>>;

    async fn update_status(&self, id: Uuid, status: CallStatus) -> Result<bool>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct SqliteCallStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCallStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open calls db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS calls (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_calls_user_created ON calls(user_id, created_at ASC)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn row_to_call(row: &Row<'_>) -> rusqlite::Result<Call> {
        let id: String = row.get(0)?;
        let status: String = row.get(4)?;
        let created_at: String = row.get(5)?;
        let user_id: String = row.get(6)?;

        Ok(Call {
            id: parse_uuid(0, &id)?,
            client_name: row.get(1)?,
            phone_number: row.get(2)?,
            description: row.get(3)?,
            status: CallStatus::parse(&status).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    format!("unknown call status {:?}", status).into(),
                )
            })?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?
                .with_timezone(&Utc),
            user_id: parse_uuid(6, &user_id)?,
        })
    }
}

fn parse_uuid(col: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, e.into())
    })
}

#[async_trait]
impl CallStore for SqliteCallStore {
    async fn create(&self, call: &Call) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO calls (id, client_name, phone_number, description, status, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                call.id.to_string(),
                call.client_name,
                call.phone_number,
                call.description,
                call.status.as_str(),
                // Fixed width so ORDER BY created_at sorts chronologically
                call.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                call.user_id.to_string(),
            ],
        )
        .context("Failed to insert call")?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Call>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, client_name, phone_number, description, status, created_at, user_id
             FROM calls WHERE id = ?1",
        )?;

        stmt.query_row(params![id.to_string()], Self::row_to_call)
            .optional()
            .context("Failed to load call")
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Call>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, client_name, phone_number, description, status, created_at, user_id
             FROM calls WHERE user_id = ?1 ORDER BY created_at ASC",
        )?;

        let calls = stmt
            .query_map(params![owner_id.to_string()], Self::row_to_call)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list calls")?;

        Ok(calls)
    }

    async fn update_status(&self, id: Uuid, status: CallStatus) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                "UPDATE calls SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.to_string()],
            )
            .context("Failed to update call status")?;
        Ok(changed > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute("DELETE FROM calls WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete call")?;
        Ok(removed > 0)
    }
}
