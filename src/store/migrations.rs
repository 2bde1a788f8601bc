//! Schema versioning for the SQLite profile store.
//!
//! Applied versions are tracked in `schema_migrations`; each pending
//! migration runs in its own transaction together with its bookkeeping row.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::store::{StoreError, StoreResult};

/// Version of the last migration in [`get_migrations`].
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i32,
    pub name: String,
    pub sql: String,
}

impl Migration {
    pub fn new(version: i32, name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// All migrations, ordered by version.
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "subject profiles",
            r#"
            CREATE TABLE IF NOT EXISTS subject_profiles (
                learner_id TEXT NOT NULL,
                subject_key TEXT NOT NULL,
                profile_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (learner_id, subject_key)
            );
            "#,
        ),
        Migration::new(
            2,
            "learner lookup index",
            r#"
            CREATE INDEX IF NOT EXISTS idx_subject_profiles_learner_updated
                ON subject_profiles(learner_id, updated_at);
            "#,
        ),
    ]
}

fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| StoreError::Migration(format!("failed to create migrations table: {e}")))
}

/// Highest applied version, 0 for a fresh database.
pub fn get_current_version(conn: &Connection) -> StoreResult<i32> {
    ensure_migrations_table(conn)?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn get_applied_versions(conn: &Connection) -> StoreResult<Vec<i32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i32>, _>>()?;
    Ok(versions)
}

fn apply(conn: &mut Connection, migration: &Migration) -> StoreResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(&migration.sql)
        .map_err(|e| StoreError::Migration(format!("v{} ({}): {e}", migration.version, migration.name)))?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Applies every pending migration and returns the resulting version.
pub fn run_migrations(conn: &mut Connection) -> StoreResult<i32> {
    ensure_migrations_table(conn)?;
    let applied = get_applied_versions(conn)?;
    let mut version = get_current_version(conn)?;

    for migration in get_migrations() {
        if applied.contains(&migration.version) {
            continue;
        }

        tracing::info!(version = migration.version, name = %migration.name, "applying migration");
        if let Err(err) = apply(conn, &migration) {
            tracing::error!(version = migration.version, error = %err, "migration failed");
            return Err(err);
        }
        version = migration.version;
    }

    tracing::debug!(version, "schema up to date");
    Ok(version)
}
