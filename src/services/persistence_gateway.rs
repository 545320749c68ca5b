//! Persistence gateway: the key-value store boundary and the document
//! load/save logic built on top of it.
//!
//! A store publishes a `StorageChange` for every write. Each writer tags its
//! writes with an origin id so a listener can tell its own echoes from
//! changes made by another process or browser tab.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::services::id_generator::{new_id, IdKind};
use crate::services::validation::document_from_value;
use crate::types::document::{ActiveView, Document};
use crate::types::errors::{ImportError, StorageError};

/// Capacity of the change notification channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A write observed on the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    /// New value; `None` when the key was deleted.
    pub value: Option<String>,
    /// Origin id of the writer, `None` when it is unknown (another process).
    pub origin: Option<String>,
}

/// Shared key-value storage with change notification.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str, origin: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str, origin: &str) -> Result<(), StorageError>;
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// In-process store, used by tests and as a scratch backend.
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: Mutex::new(HashMap::new()),
            changes,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, origin: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        // No receivers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            value: Some(value.to_string()),
            origin: Some(origin.to_string()),
        });
        Ok(())
    }

    fn delete(&self, key: &str, origin: &str) -> Result<(), StorageError> {
        if self.lock()?.remove(key).is_some() {
            let _ = self.changes.send(StorageChange {
                key: key.to_string(),
                value: None,
                origin: Some(origin.to_string()),
            });
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Loads and saves the document (and the active view) under fixed keys.
#[derive(Clone)]
pub struct DocumentGateway {
    store: Arc<dyn KeyValueStore>,
    origin: String,
    document_key: String,
    active_view_key: String,
}

impl DocumentGateway {
    /// Creates a gateway with a fresh origin id.
    pub fn new(store: Arc<dyn KeyValueStore>, document_key: &str, active_view_key: &str) -> Self {
        Self {
            store,
            origin: new_id(IdKind::Origin),
            document_key: document_key.to_string(),
            active_view_key: active_view_key.to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn document_key(&self) -> &str {
        &self.document_key
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.store.subscribe()
    }

    /// True when `change` is a document write made by someone else.
    pub fn is_remote_document_change(&self, change: &StorageChange) -> bool {
        change.key == self.document_key && change.origin.as_deref() != Some(self.origin.as_str())
    }

    /// Parses a stored document. Data saved before the trash existed has no
    /// `trash` field and is accepted with an empty trash.
    pub fn decode(raw: &str) -> Result<Document, ImportError> {
        let mut value: Value =
            serde_json::from_str(raw).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.entry("trash").or_insert_with(|| Value::Array(Vec::new()));
        }
        document_from_value(value)
    }

    /// Loads the stored document, or `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Document>, StorageError> {
        match self.store.get(&self.document_key)? {
            None => Ok(None),
            Some(raw) => Self::decode(&raw)
                .map(Some)
                .map_err(|e| StorageError::SerializationError(e.to_string())),
        }
    }

    /// Loads the stored document, seeding and saving the default one when
    /// storage is empty.
    pub fn load_or_seed(&self) -> Result<Document, StorageError> {
        if let Some(doc) = self.load()? {
            info!("loaded document with {} tab(s)", doc.tabs.len());
            return Ok(doc);
        }
        info!("no saved document; writing the default collection");
        let seed = Document::seed();
        self.save(&seed)?;
        Ok(seed)
    }

    pub fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(doc).map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.store.set(&self.document_key, &json, &self.origin)
    }

    pub fn load_active_view(&self) -> Option<ActiveView> {
        match self.store.get(&self.active_view_key) {
            Ok(value) => value.as_deref().map(ActiveView::from_stored),
            Err(e) => {
                warn!("could not read active view: {}", e);
                None
            }
        }
    }

    pub fn save_active_view(&self, view: &ActiveView) -> Result<(), StorageError> {
        self.store.set(&self.active_view_key, view.as_stored(), &self.origin)
    }
}
