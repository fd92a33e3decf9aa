//! # Storage
//!
//! Persistence adapter between the tracker and a string key-value store.
//!
//! ## Layout
//!
//! One key per user holds the whole state bundle as a JSON object:
//!
//! | Field          | Type                                  | Description                   |
//! |----------------|---------------------------------------|-------------------------------|
//! | `version`      | `u32`                                 | Bundle schema version         |
//! | `records`      | `{ quest_id: QuestProgressRecord }`   | Per-quest progress            |
//! | `total_points` | `u64`                                 | Eco-Points balance            |
//! | `impact`       | `UserImpact`                          | Snapshot of derived impact    |
//!
//! Reads happen once, when a tracker is built. Writes happen after every
//! mutation. A blob that cannot be parsed, or carries another `version`, is
//! discarded and the tracker starts empty.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::impact::trees_equivalent;
use crate::types::{QuestProgressRecord, UserImpact};

/// Key used when a single user owns the whole store.
pub const DEFAULT_STORAGE_KEY: &str = "carbonmax-progress";

/// Schema version written into every bundle.
pub const STATE_VERSION: u32 = 1;

/// Synchronous string store. Implementations swallow their own failures.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value)
    }
}

/// Process-local store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

/// Everything the tracker persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub records: BTreeMap<String, QuestProgressRecord>,
    pub total_points: u64,
    pub impact: UserImpact,
}

#[derive(Serialize)]
struct BundleRef<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a ProgressState,
}

#[derive(Deserialize)]
struct Bundle {
    version: u32,
    #[serde(flatten)]
    state: ProgressState,
}

/// Serialize a state bundle to its stored JSON form.
pub fn encode_state(state: &ProgressState) -> serde_json::Result<String> {
    serde_json::to_string(&BundleRef {
        version: STATE_VERSION,
        state,
    })
}

/// Parse a stored bundle. Returns `None` for anything unusable.
pub fn decode_state(raw: &str) -> Option<ProgressState> {
    let bundle: Bundle = match serde_json::from_str(raw) {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!("Discarding unreadable progress state: {e}");
            return None;
        }
    };
    if bundle.version != STATE_VERSION {
        warn!(
            "Discarding progress state with unsupported version {} (expected {STATE_VERSION})",
            bundle.version
        );
        return None;
    }
    let mut state = bundle.state;
    state.impact.trees_equivalent = trees_equivalent(state.impact.co2_avoided_kg);
    Some(state)
}

/// Read the bundle under `key`, falling back to an empty state.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> ProgressState {
    store
        .get(key)
        .and_then(|raw| decode_state(&raw))
        .unwrap_or_default()
}

/// Write the bundle under `key`. Failures are logged and dropped.
pub fn save_state<S: KeyValueStore + ?Sized>(store: &S, key: &str, state: &ProgressState) {
    match encode_state(state) {
        Ok(json) => store.set(key, json),
        Err(e) => warn!("Failed to serialize progress state for {key}: {e}"),
    }
}
