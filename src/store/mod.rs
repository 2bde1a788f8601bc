//! Profile persistence.
//!
//! The engine only needs keyed get/put of whole [`SubjectProfile`] documents
//! plus a per-learner subject listing, so any backend that can do that
//! implements [`ProfileStore`]. Two backends ship here:
//! - [`MemoryProfileStore`] for tests and embedding
//! - [`sqlite::SqliteProfileStore`] for durable single-node use

pub mod migrations;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::difficulty::types::{ProfileKey, SubjectProfile};

pub use sqlite::SqliteProfileStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable get/put of one [`SubjectProfile`] per (learner, subject).
pub trait ProfileStore: Send + Sync {
    /// `None` when nothing is stored under `key`.
    fn get(&self, key: &ProfileKey) -> StoreResult<Option<SubjectProfile>>;

    /// Inserts or replaces the profile stored under `key`.
    fn put(&self, key: &ProfileKey, profile: &SubjectProfile) -> StoreResult<()>;

    /// Subject keys with a stored profile for `learner_id`, sorted.
    fn subjects_for(&self, learner_id: &str) -> StoreResult<Vec<String>>;
}

impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    fn get(&self, key: &ProfileKey) -> StoreResult<Option<SubjectProfile>> {
        (**self).get(key)
    }

    fn put(&self, key: &ProfileKey, profile: &SubjectProfile) -> StoreResult<()> {
        (**self).put(key, profile)
    }

    fn subjects_for(&self, learner_id: &str) -> StoreResult<Vec<String>> {
        (**self).subjects_for(learner_id)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<ProfileKey, SubjectProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, key: &ProfileKey) -> StoreResult<Option<SubjectProfile>> {
        Ok(self.profiles.read().get(key).cloned())
    }

    fn put(&self, key: &ProfileKey, profile: &SubjectProfile) -> StoreResult<()> {
        self.profiles.write().insert(key.clone(), profile.clone());
        Ok(())
    }

    fn subjects_for(&self, learner_id: &str) -> StoreResult<Vec<String>> {
        let mut subjects: Vec<String> = self
            .profiles
            .read()
            .keys()
            .filter(|k| k.learner_id == learner_id)
            .map(|k| k.subject_key.clone())
            .collect();
        subjects.sort();
        Ok(subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_memory_store_put_get() {
        let store = MemoryProfileStore::new();
        let key = ProfileKey::new("u1", "math");
        assert!(store.get(&key).unwrap().is_none());

        let profile = SubjectProfile::new(&key, Utc::now());
        store.put(&key, &profile).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(profile));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_subjects_for_filters_by_learner() {
        let store = MemoryProfileStore::new();
        let now = Utc::now();
        for (learner, subject) in [("u1", "physics"), ("u1", "algebra"), ("u2", "art")] {
            let key = ProfileKey::new(learner, subject);
            store.put(&key, &SubjectProfile::new(&key, now)).unwrap();
        }

        assert_eq!(store.subjects_for("u1").unwrap(), vec!["algebra", "physics"]);
        assert!(store.subjects_for("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_arc_store_delegates() {
        let store = Arc::new(MemoryProfileStore::new());
        let shared: Arc<dyn ProfileStore> = store.clone();
        let key = ProfileKey::new("u1", "math");
        shared.put(&key, &SubjectProfile::new(&key, Utc::now())).unwrap();
        assert_eq!(store.len(), 1);
    }
}
