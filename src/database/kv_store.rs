//! SQLite-backed [`KeyValueStore`].
//!
//! Writes through this store are broadcast to in-process subscribers right
//! away. Writes made by other connections (another process sharing the file)
//! are picked up by [`SqliteStore::poll_external_changes`], which scans rows
//! whose revision is newer than the last one seen. Deletions made elsewhere
//! are not reported.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use rusqlite::{params, OptionalExtension};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::connection::Database;
use crate::services::persistence_gateway::{KeyValueStore, StorageChange, CHANGE_CHANNEL_CAPACITY};
use crate::types::errors::StorageError;

struct Inner {
    db: Database,
    last_seen_revision: i64,
    local_origins: HashSet<String>,
}

/// Key-value store persisted in the `kv_store` table.
pub struct SqliteStore {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<StorageChange>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_database(Database::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_database(Database::open_in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self, StorageError> {
        let last_seen_revision = Self::max_revision(&db)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Mutex::new(Inner {
                db,
                last_seen_revision,
                local_origins: HashSet::new(),
            }),
            changes,
        })
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn max_revision(db: &Database) -> Result<i64, StorageError> {
        let rev: i64 = db.connection().query_row(
            "SELECT COALESCE(MAX(revision), 0) FROM kv_store",
            [],
            |row| row.get(0),
        )?;
        Ok(rev)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    /// Broadcasts rows written by other connections since the last poll.
    /// Returns how many changes were published.
    pub fn poll_external_changes(&self) -> Result<usize, StorageError> {
        let mut inner = self.lock()?;
        let rows: Vec<(String, String, i64, Option<String>)> = {
            let mut stmt = inner.db.connection().prepare(
                "SELECT key, value, revision, origin FROM kv_store \
                 WHERE revision > ?1 ORDER BY revision",
            )?;
            let mapped = stmt.query_map(params![inner.last_seen_revision], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            let collected: Vec<_> = mapped.collect::<Result<_, _>>()?;
            collected
        };

        let mut published = 0;
        for (key, value, revision, origin) in rows {
            inner.last_seen_revision = inner.last_seen_revision.max(revision);
            let is_local = origin
                .as_ref()
                .map(|o| inner.local_origins.contains(o))
                .unwrap_or(false);
            if is_local {
                continue;
            }
            debug!("external change on {} (revision {})", key, revision);
            let _ = self.changes.send(StorageChange {
                key,
                value: Some(value),
                origin,
            });
            published += 1;
        }
        Ok(published)
    }

    /// Polls for external changes every `interval` until the store is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else { break };
                if let Err(e) = store.poll_external_changes() {
                    warn!("polling for external changes failed: {}", e);
                }
            }
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.lock()?;
        let value = inner
            .db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str, origin: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.local_origins.insert(origin.to_string());
        inner.db.connection().execute(
            "INSERT INTO kv_store (key, value, revision, updated_at, origin) \
             VALUES (?1, ?2, (SELECT COALESCE(MAX(revision), 0) + 1 FROM kv_store), ?3, ?4) \
             ON CONFLICT(key) DO UPDATE SET \
                 value = excluded.value, \
                 revision = excluded.revision, \
                 updated_at = excluded.updated_at, \
                 origin = excluded.origin",
            params![key, value, Self::now(), origin],
        )?;
        drop(inner);

        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            value: Some(value.to_string()),
            origin: Some(origin.to_string()),
        });
        Ok(())
    }

    fn delete(&self, key: &str, origin: &str) -> Result<(), StorageError> {
        let inner = self.lock()?;
        let affected = inner
            .db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        drop(inner);

        if affected > 0 {
            let _ = self.changes.send(StorageChange {
                key: key.to_string(),
                value: None,
                origin: Some(origin.to_string()),
            });
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.lock()?;
        let mut stmt = inner
            .db
            .connection()
            .prepare("SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
