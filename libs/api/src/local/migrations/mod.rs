//! Schema migrations
//!
//! A migration is a pair of SQL scripts. Each script runs inside one
//! transaction together with its `_migrations` bookkeeping row, so a
//! failed step leaves the schema exactly as it was.

use libsql::{Connection, Value};

mod v001_click_ledger;
mod v002_browser_sessions;

pub struct Migration {
    /// Unique, increasing version number
    pub version: u32,
    pub description: &'static str,
    pub up: &'static [&'static str],
    pub down: &'static [&'static str],
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration v{version:03} ({description}) failed: {source}")]
    Apply {
        version: u32,
        description: &'static str,
        #[source]
        source: libsql::Error,
    },

    #[error("rollback of migration v{version:03} failed: {source}")]
    Rollback {
        version: u32,
        #[source]
        source: libsql::Error,
    },

    #[error("database is at migration v{0:03}, which this build does not know")]
    Unknown(u32),

    #[error("invalid version in _migrations: {0}")]
    InvalidVersion(String),

    #[error("migration bookkeeping failed: {0}")]
    Database(#[from] libsql::Error),
}

pub fn all_migrations() -> &'static [Migration] {
    &[v001_click_ledger::MIGRATION, v002_browser_sessions::MIGRATION]
}

/// Apply every pending migration, returning the versions applied
pub async fn apply_all(conn: &Connection) -> Result<Vec<u32>, MigrationError> {
    apply_pending(conn, all_migrations()).await
}

pub(crate) async fn apply_pending(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<Vec<u32>, MigrationError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        (),
    )
    .await?;

    let applied = get_applied_versions(conn).await?;
    let mut newly_applied = Vec::new();

    for migration in migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
    {
        run_script(conn, migration, Direction::Up).await?;
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "applied migration"
        );
        newly_applied.push(migration.version);
    }

    Ok(newly_applied)
}

/// Roll back the most recent migration, if any
pub async fn rollback_last(conn: &Connection) -> Result<Option<u32>, MigrationError> {
    let Some(&last) = get_applied_versions(conn).await?.last() else {
        return Ok(None);
    };

    let migration = all_migrations()
        .iter()
        .find(|m| m.version == last)
        .ok_or(MigrationError::Unknown(last))?;

    run_script(conn, migration, Direction::Down).await?;
    tracing::debug!(version = last, "rolled back migration");
    Ok(Some(last))
}

/// Highest applied version, 0 for a fresh database
pub async fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
    Ok(get_applied_versions(conn)
        .await?
        .last()
        .copied()
        .unwrap_or(0))
}

/// Applied versions in ascending order
pub async fn get_applied_versions(conn: &Connection) -> Result<Vec<u32>, MigrationError> {
    let mut tables = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_migrations'",
            (),
        )
        .await?;
    if tables.next().await?.is_none() {
        return Ok(Vec::new());
    }
    drop(tables);

    let mut rows = conn
        .query("SELECT version FROM _migrations ORDER BY version", ())
        .await?;

    let mut versions = Vec::new();
    while let Some(row) = rows.next().await? {
        let version = match row.get_value(0)? {
            Value::Integer(raw) => {
                u32::try_from(raw).map_err(|_| MigrationError::InvalidVersion(raw.to_string()))?
            }
            other => return Err(MigrationError::InvalidVersion(format!("{other:?}"))),
        };
        versions.push(version);
    }
    Ok(versions)
}

pub async fn run_migrations(conn: &Connection) -> Result<(), MigrationError> {
    apply_all(conn).await.map(|_| ())
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

async fn run_script(
    conn: &Connection,
    migration: &Migration,
    direction: Direction,
) -> Result<(), MigrationError> {
    let tx = conn.transaction().await?;

    let outcome = async {
        let script = match direction {
            Direction::Up => migration.up,
            Direction::Down => migration.down,
        };
        for statement in script {
            tx.execute(statement, ()).await?;
        }

        match direction {
            Direction::Up => {
                tx.execute(
                    "INSERT INTO _migrations (version, description, applied_at)
                     VALUES (?, ?, datetime('now'))",
                    (migration.version, migration.description),
                )
                .await?
            }
            Direction::Down => {
                tx.execute(
                    "DELETE FROM _migrations WHERE version = ?",
                    [migration.version],
                )
                .await?
            }
        };
        Ok::<(), libsql::Error>(())
    }
    .await;

    match outcome {
        Ok(()) => {
            tx.commit().await?;
            Ok(())
        }
        Err(source) => {
            if let Err(error) = tx.rollback().await {
                tracing::error!(%error, version = migration.version, "rollback after failed migration failed");
            }
            Err(match direction {
                Direction::Up => MigrationError::Apply {
                    version: migration.version,
                    description: migration.description,
                    source,
                },
                Direction::Down => MigrationError::Rollback {
                    version: migration.version,
                    source,
                },
            })
        }
    }
}
