//! SQLite-backed [`KeyValueStore`].
//!
//! Every row is read once at startup into an in-memory cache. `get` serves
//! from the cache; `set` updates the cache and queues an upsert for a
//! background writer, so trackers never wait on the database.
//!
//! Writes are applied in the order they were queued. A failed write is
//! logged and dropped. On shutdown the writer drains whatever is still
//! queued before exiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use carbonmax_progress::KeyValueStore;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::db;
use crate::errors::Result;

type PendingWrite = (String, String);

#[derive(Clone)]
pub struct SqliteStore {
    cache: Arc<Mutex<HashMap<String, String>>>,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

impl SqliteStore {
    /// Load all stored entries and spawn the background writer.
    ///
    /// The returned handle completes once `shutdown` is cancelled and the
    /// queue has been flushed.
    pub async fn open(
        pool: SqlitePool,
        shutdown: CancellationToken,
    ) -> Result<(Self, JoinHandle<()>)> {
        let entries = db::load_entries(&pool).await?;
        info!("Loaded {} stored progress entries", entries.len());

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(pool, rx, shutdown));

        let store = Self {
            cache: Arc::new(Mutex::new(entries.into_iter().collect())),
            writes: tx,
        };
        Ok((store, writer))
    }

    /// Cached entries whose key starts with `prefix`.
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        if self.writes.send((key.to_string(), value)).is_err() {
            error!("Progress writer has stopped; {key} was not persisted");
        }
    }
}

async fn run_writer(
    pool: SqlitePool,
    mut rx: mpsc::UnboundedReceiver<PendingWrite>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some((key, value)) => write_one(&pool, &key, &value).await,
                None => break,
            },
            _ = shutdown.cancelled() => {
                rx.close();
                while let Some((key, value)) = rx.recv().await {
                    write_one(&pool, &key, &value).await;
                }
                break;
            }
        }
    }
    info!("Progress writer stopped");
}

async fn write_one(pool: &SqlitePool, key: &str, value: &str) {
    if let Err(e) = db::upsert_entry(pool, key, value).await {
        error!("Failed to persist {key}: {e}");
    }
}
