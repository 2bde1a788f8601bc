use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::difficulty::types::{ProfileKey, SubjectProfile};
use crate::store::{migrations, ProfileStore, StoreError, StoreResult};

/// Stores each profile as one JSON document keyed by learner and subject.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
    db_path: String,
}

impl SqliteProfileStore {
    /// Opens (or creates) a database file in WAL mode and migrates it.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db_path = path.as_ref().to_string_lossy().to_string();
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("cannot create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;
        Self::with_connection(conn, db_path)
    }

    /// Private in-memory database, migrated; contents are lost on drop.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn with_connection(mut conn: Connection, db_path: String) -> StoreResult<Self> {
        let version = migrations::run_migrations(&mut conn)?;
        tracing::info!(path = %db_path, version, "profile store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Number of stored profiles across all learners.
    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM subject_profiles", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn get(&self, key: &ProfileKey) -> StoreResult<Option<SubjectProfile>> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT profile_json FROM subject_profiles WHERE learner_id = ?1 AND subject_key = ?2",
                params![key.learner_id, key.subject_key],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &ProfileKey, profile: &SubjectProfile) -> StoreResult<()> {
        let json = serde_json::to_string(profile)?;
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO subject_profiles (learner_id, subject_key, profile_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(learner_id, subject_key) DO UPDATE SET
                profile_json = excluded.profile_json,
                updated_at = excluded.updated_at
            "#,
            params![
                key.learner_id,
                key.subject_key,
                json,
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn subjects_for(&self, learner_id: &str) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT subject_key FROM subject_profiles WHERE learner_id = ?1 ORDER BY subject_key",
        )?;
        let subjects = stmt
            .query_map([learner_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::types::{PerformanceInput, PerformanceRecord, Tier};
    use chrono::Utc;

    #[test]
    fn test_in_memory_round_trip() {
        let store = SqliteProfileStore::in_memory().unwrap();
        let key = ProfileKey::new("u1", "math");
        let now = Utc::now();

        let mut profile = SubjectProfile::new(&key, now);
        profile.performance_history.push(PerformanceRecord::from_input(
            PerformanceInput::new("q1").with_accuracy(0.8).with_response_time(9.5),
            Tier::Intermediate,
            now,
        ));
        profile.current_difficulty = Tier::Advanced;

        store.put(&key, &profile).unwrap();
        let loaded = store.get(&key).unwrap().unwrap();
        assert_eq!(loaded.current_difficulty, Tier::Advanced);
        assert_eq!(loaded.performance_history, profile.performance_history);
        assert_eq!(store.path(), ":memory:");
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = SqliteProfileStore::in_memory().unwrap();
        assert!(store.get(&ProfileKey::new("u1", "math")).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }
}
