//! Per-user tracker registry.
//!
//! Trackers are cached once a user has stored progress or is written to,
//! which is the only time a user's stored bundle is read. Reads of unknown
//! users are answered from a throwaway tracker and leave the cache alone.
//! All access goes through one mutex, so two requests for the same user can
//! never interleave their writes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use carbonmax_progress::{storage, AggregateImpact, KeyValueStore, ProgressTracker};
use tracing::debug;

use crate::store::SqliteStore;

const MAX_USER_ID_LEN: usize = 64;

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidUserId;

impl std::fmt::Display for InvalidUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "user id must be 1-{MAX_USER_ID_LEN} characters of letters, digits, '-' or '_'"
        )
    }
}

pub fn validate_user_id(user_id: &str) -> Result<(), InvalidUserId> {
    let valid = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(InvalidUserId)
    }
}

pub struct TrackerRegistry {
    store: SqliteStore,
    key_prefix: String,
    trackers: Mutex<HashMap<String, ProgressTracker<SqliteStore>>>,
}

impl TrackerRegistry {
    pub fn new(store: SqliteStore, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            trackers: Mutex::new(HashMap::new()),
        }
    }

    fn storage_key(&self, user_id: &str) -> String {
        format!("{}:{user_id}", self.key_prefix)
    }

    /// Run `f` against the tracker for `user_id`, creating it if needed.
    pub fn with_tracker<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut ProgressTracker<SqliteStore>) -> R,
    ) -> Result<R, InvalidUserId> {
        validate_user_id(user_id)?;
        let mut trackers = self.trackers.lock().unwrap_or_else(PoisonError::into_inner);
        let tracker = trackers.entry(user_id.to_string()).or_insert_with(|| {
            debug!("Creating tracker for user {user_id}");
            ProgressTracker::load(self.store.clone(), self.storage_key(user_id))
        });
        Ok(f(tracker))
    }

    /// Run `f` against a read-only view of `user_id`'s progress.
    ///
    /// Users with nothing stored get an empty tracker that is not cached.
    pub fn read_tracker<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&ProgressTracker<SqliteStore>) -> R,
    ) -> Result<R, InvalidUserId> {
        validate_user_id(user_id)?;
        let mut trackers = self.trackers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tracker) = trackers.get(user_id) {
            return Ok(f(tracker));
        }
        let key = self.storage_key(user_id);
        if self.store.get(&key).is_none() {
            return Ok(f(&ProgressTracker::load(self.store.clone(), key)));
        }
        debug!("Creating tracker for user {user_id}");
        let tracker = trackers
            .entry(user_id.to_string())
            .or_insert_with(|| ProgressTracker::load(self.store.clone(), key));
        Ok(f(tracker))
    }

    #[cfg(test)]
    fn loaded_users(&self) -> usize {
        self.trackers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Impact summed over every stored user bundle.
    pub fn aggregate_impact(&self) -> AggregateImpact {
        let prefix = format!("{}:", self.key_prefix);
        let states: Vec<_> = self
            .store
            .entries_with_prefix(&prefix)
            .into_iter()
            .filter_map(|(_, raw)| storage::decode_state(&raw))
            .collect();
        states.iter().map(|state| &state.impact).collect()
    }
}
