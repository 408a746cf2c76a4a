//! Local SQLite storage implementation
//!
//! Implements the contribution ledger and the session store on a local
//! libsql database.

use crate::storage::{
    BrowserSession, Contribution, ContributionLedger, ContributionReceipt, SessionStore,
    StorageError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harmonist_shared::models::Identity;
use libsql::{Connection, Row, Value};
use std::path::Path;
use tokio::sync::Mutex;

/// Local SQLite storage implementation
///
/// The connection is shared behind a `Mutex` so one transaction runs at a
/// time on it. Contribution atomicity comes from the primary key and the
/// transaction, not from this lock.
pub struct LocalStorage {
    conn: Mutex<Connection>,
}

impl LocalStorage {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self, StorageError> {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Connection(format!("Failed to create database directory: {}", e))
            })?;
        }

        let db = libsql::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db.connect().map_err(|e| {
            StorageError::Connection(format!("Failed to connect to database: {}", e))
        })?;

        Self::from_connection(conn).await
    }

    /// Wrap an existing connection, initializing the schema if needed
    pub async fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        super::migrations::run_migrations(&conn)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// Get connection reference (locked)
    ///
    /// Useful for direct SQL access in tests or migrations.
    pub fn connection(&self) -> &Mutex<Connection> {
        &self.conn
    }
}

#[async_trait]
impl ContributionLedger for LocalStorage {
    async fn record_contribution(
        &self,
        identity: &Identity,
    ) -> Result<ContributionReceipt, StorageError> {
        if identity.id.trim().is_empty() {
            return Err(StorageError::InvalidRequest(
                "identity id must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await?;

        let inserted = tx
            .execute(
                "INSERT INTO contributions (identity_id, display_name, email, created_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(identity_id) DO NOTHING",
                (
                    identity.id.as_str(),
                    identity.display_name.as_str(),
                    identity.email.as_str(),
                    now.to_rfc3339(),
                ),
            )
            .await?;

        if inserted == 0 {
            tx.rollback().await?;
            return Err(StorageError::AlreadyContributed);
        }

        tx.execute(
            "INSERT INTO click_counter (id, count) VALUES (1, 1)
             ON CONFLICT(id) DO UPDATE SET count = count + 1",
            (),
        )
        .await?;

        let count = read_counter(&tx).await?;
        tx.commit().await?;

        Ok(ContributionReceipt {
            created: true,
            count,
        })
    }

    async fn get_contribution(
        &self,
        identity_id: &str,
    ) -> Result<Option<Contribution>, StorageError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT identity_id, display_name, email, created_at
                 FROM contributions WHERE identity_id = ?",
                [identity_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let created_at: String = row.get(3)?;
        Ok(Some(Contribution {
            identity_id: row.get(0)?,
            display_name: row.get(1)?,
            email: row.get(2)?,
            created_at: parse_datetime(&created_at)?,
        }))
    }

    async fn click_count(&self) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        read_counter(&conn).await
    }

    async fn contribution_count(&self) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        count_contributions(&conn).await
    }

    async fn reconcile_counter(&self) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await?;

        let contributions = count_contributions(&tx).await?;
        let stored = read_counter(&tx).await?;

        if stored != contributions {
            tracing::warn!(
                stored,
                contributions,
                "click counter out of sync with contributions, resetting"
            );
            tx.execute(
                "INSERT INTO click_counter (id, count) VALUES (1, ?)
                 ON CONFLICT(id) DO UPDATE SET count = excluded.count",
                [to_sql_integer(contributions)?],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(contributions)
    }
}

#[async_trait]
impl SessionStore for LocalStorage {
    async fn create_session(
        &self,
        token: &str,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<BrowserSession, StorageError> {
        if token.is_empty() {
            return Err(StorageError::InvalidRequest(
                "session token must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_at = from_unix(expires_at.timestamp())?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO browser_sessions
             (token, identity_id, display_name, email, photo_url, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                token,
                identity.id.as_str(),
                identity.display_name.as_str(),
                identity.email.as_str(),
                identity.photo_url.as_deref(),
                now.to_rfc3339(),
                expires_at.timestamp(),
            ),
        )
        .await?;

        Ok(BrowserSession {
            token: token.to_string(),
            identity: identity.clone(),
            created_at: now,
            expires_at,
        })
    }

    async fn get_session(&self, token: &str) -> Result<Option<BrowserSession>, StorageError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT token, identity_id, display_name, email, photo_url, created_at, expires_at
                 FROM browser_sessions WHERE token = ? AND expires_at > ?",
                (token, Utc::now().timestamp()),
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let photo_url = optional_text(&row, 4)?;
        let created_at: String = row.get(5)?;
        let expires_at: i64 = row.get(6)?;

        let mut identity = Identity::new(
            row.get::<String>(1)?,
            row.get::<String>(2)?,
            row.get::<String>(3)?,
        );
        identity.photo_url = photo_url;

        Ok(Some(BrowserSession {
            token: row.get(0)?,
            identity,
            created_at: parse_datetime(&created_at)?,
            expires_at: from_unix(expires_at)?,
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM browser_sessions WHERE token = ?", [token])
            .await?;
        Ok(())
    }

    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute(
                "DELETE FROM browser_sessions WHERE expires_at <= ?",
                [now.timestamp()],
            )
            .await?;
        Ok(removed)
    }
}

async fn read_counter(conn: &Connection) -> Result<u64, StorageError> {
    let mut rows = conn
        .query("SELECT count FROM click_counter WHERE id = 1", ())
        .await?;

    match rows.next().await? {
        Some(row) => from_sql_integer(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

async fn count_contributions(conn: &Connection) -> Result<u64, StorageError> {
    let mut rows = conn
        .query("SELECT COUNT(*) FROM contributions", ())
        .await?;

    match rows.next().await? {
        Some(row) => from_sql_integer(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

/// Nullable TEXT column; any other stored type is reported, not dropped
fn optional_text(row: &Row, index: i32) -> Result<Option<String>, StorageError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(StorageError::Internal(format!(
            "Column {index} holds {other:?}, expected text"
        ))),
    }
}

fn from_sql_integer(value: i64) -> Result<u64, StorageError> {
    u64::try_from(value)
        .map_err(|_| StorageError::Internal(format!("negative counter value: {}", value)))
}

fn to_sql_integer(value: u64) -> Result<i64, StorageError> {
    i64::try_from(value)
        .map_err(|_| StorageError::Internal(format!("counter value out of range: {}", value)))
}

fn from_unix(seconds: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| StorageError::Internal(format!("invalid timestamp: {}", seconds)))
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Internal(format!("invalid timestamp '{}': {}", value, e)))
}
