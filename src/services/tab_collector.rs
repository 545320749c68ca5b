//! Cross-process "pull open tabs" protocol over the shared key-value store.
//!
//! The collector writes a fresh request id under the trigger key, waits a
//! fixed settle window, then gathers every entry keyed
//! `prefix + request_id + ":" + suffix` and deletes them. Responders watch the
//! trigger key and write one entry per open tab. Entries arriving after the
//! window are never read.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::services::id_generator::{new_id, now_millis, IdKind};
use crate::services::persistence_gateway::{KeyValueStore, StorageChange};
use crate::types::document::Link;
use crate::types::errors::StorageError;
use crate::types::settings::SyncSettings;

/// One open tab reported by a responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulledTab {
    pub title: String,
    pub url: String,
}

/// Result of a pull round.
#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    Collected(Vec<Link>),
    NoResponders,
}

impl PullOutcome {
    pub fn links(&self) -> &[Link] {
        match self {
            PullOutcome::Collected(links) => links,
            PullOutcome::NoResponders => &[],
        }
    }
}

fn response_prefix(prefix: &str, request_id: &str) -> String {
    format!("{}{}:", prefix, request_id)
}

/// Requesting side of a pull.
#[derive(Clone)]
pub struct TabCollector {
    store: Arc<dyn KeyValueStore>,
    origin: String,
    trigger_key: String,
    response_prefix: String,
    settle: Duration,
}

impl TabCollector {
    pub fn new(store: Arc<dyn KeyValueStore>, origin: &str, sync: &SyncSettings) -> Self {
        Self {
            store,
            origin: origin.to_string(),
            trigger_key: sync.pull_trigger_key.clone(),
            response_prefix: sync.pull_response_prefix.clone(),
            settle: Duration::from_millis(sync.pull_settle_delay_ms),
        }
    }

    /// Broadcasts a pull request and collects whatever answered within the
    /// settle window. Malformed entries are dropped (and still deleted).
    pub async fn pull(&self) -> Result<PullOutcome, StorageError> {
        let request_id = new_id(IdKind::Request);
        self.store.set(&self.trigger_key, &request_id, &self.origin)?;
        debug!("pull {} broadcast; waiting {:?}", request_id, self.settle);

        tokio::time::sleep(self.settle).await;

        let prefix = response_prefix(&self.response_prefix, &request_id);
        let keys = self.store.keys_with_prefix(&prefix)?;
        let imported_at = now_millis();
        let mut links = Vec::with_capacity(keys.len());

        for key in keys {
            if let Some(raw) = self.store.get(&key)? {
                match serde_json::from_str::<PulledTab>(&raw) {
                    Ok(tab) if !tab.url.trim().is_empty() => {
                        let mut link = Link::new(new_id(IdKind::Link), &tab.title, tab.url.trim());
                        link.imported_at = Some(imported_at);
                        links.push(link);
                    }
                    Ok(_) => warn!("pulled entry {} has no url", key),
                    Err(e) => warn!("pulled entry {} is malformed: {}", key, e),
                }
            }
            self.store.delete(&key, &self.origin)?;
        }
        self.store.delete(&self.trigger_key, &self.origin)?;

        if links.is_empty() {
            info!("pull {}: no responders", request_id);
            Ok(PullOutcome::NoResponders)
        } else {
            info!("pull {}: collected {} tab(s)", request_id, links.len());
            Ok(PullOutcome::Collected(links))
        }
    }
}

/// Answering side of a pull.
#[derive(Clone)]
pub struct TabResponder {
    store: Arc<dyn KeyValueStore>,
    origin: String,
    trigger_key: String,
    response_prefix: String,
}

impl TabResponder {
    pub fn new(store: Arc<dyn KeyValueStore>, origin: &str, sync: &SyncSettings) -> Self {
        Self {
            store,
            origin: origin.to_string(),
            trigger_key: sync.pull_trigger_key.clone(),
            response_prefix: sync.pull_response_prefix.clone(),
        }
    }

    /// The request id carried by `change` if it is someone else's pull trigger.
    pub fn pull_request(&self, change: &StorageChange) -> Option<String> {
        if change.key != self.trigger_key || change.origin.as_deref() == Some(self.origin.as_str()) {
            return None;
        }
        change.value.clone().filter(|v| !v.is_empty())
    }

    /// Writes one entry per tab for `request_id`. Returns how many were written.
    pub fn respond(&self, request_id: &str, tabs: &[PulledTab]) -> Result<usize, StorageError> {
        let prefix = response_prefix(&self.response_prefix, request_id);
        for (n, tab) in tabs.iter().enumerate() {
            let value = serde_json::to_string(tab)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            // Origin in the key keeps entries from several responders apart.
            let key = format!("{}{}:{}", prefix, self.origin, n);
            self.store.set(&key, &value, &self.origin)?;
        }
        debug!("answered pull {} with {} tab(s)", request_id, tabs.len());
        Ok(tabs.len())
    }
}
