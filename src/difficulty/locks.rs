use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::difficulty::types::ProfileKey;

const PRUNE_THRESHOLD: usize = 1024;

/// One mutex per profile key, so load-mutate-save sequences for the same
/// learner and subject run one at a time while other keys proceed.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<ProfileKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `key`'s mutex; lock it for the duration of the write.
    pub fn handle(&self, key: &ProfileKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() >= PRUNE_THRESHOLD {
            // entries only referenced by the map are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
