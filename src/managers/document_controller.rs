//! Document controller: the one owner of the in-memory document.
//!
//! A single task holds the `LinkManager` and drains one mpsc queue. UI
//! commands, snapshot requests, imports and remote-change notifications all
//! arrive on that queue, so they are applied strictly in arrival order and a
//! remote replacement can never land in the middle of a local mutation.
//! Callers talk to the task through a cloneable [`ControllerHandle`].
//!
//! Every successful mutation is saved right away. A failed save is logged and
//! the in-memory change is kept; the next successful save writes it out.

use std::path::Path;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::managers::link_manager::{LinkManager, LinkManagerTrait};
use crate::services::backup::{read_backup, ImportMode};
use crate::services::import_adapters::{parse_bookmark_backup, parse_plain_text};
use crate::services::persistence_gateway::{DocumentGateway, StorageChange};
use crate::services::validation::parse_document;
use crate::types::command::{Command, CommandOutcome};
use crate::types::document::{ActiveView, Document, DocumentStats, Link};
use crate::types::errors::{ControllerError, LinkError, StorageError};
use crate::types::settings::ImportSettings;

/// Capacity of the controller's inbound queue.
const QUEUE_CAPACITY: usize = 64;

/// Copy of the controller state handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub document: Document,
    pub active_view: ActiveView,
    pub stats: DocumentStats,
    /// Render revision this snapshot corresponds to.
    pub revision: u64,
}

/// Where a batch of links came from; picks the container name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBatch {
    /// Plain text or bookmark backup import.
    Imported,
    /// Tabs collected from other processes.
    Pulled,
}

enum Message {
    Execute {
        command: Command,
        reply: oneshot::Sender<Result<CommandOutcome, ControllerError>>,
    },
    ImportLinks {
        batch: LinkBatch,
        links: Vec<Link>,
        reply: oneshot::Sender<Result<CommandOutcome, ControllerError>>,
    },
    Snapshot {
        reply: oneshot::Sender<DocumentSnapshot>,
    },
    /// The persisted document was written by someone else.
    RemoteChange { raw: Option<String> },
    /// Notifications were dropped; re-read the persisted document.
    Resync,
    Shutdown,
}

/// Owns the manager and the gateway; runs inside its own task.
pub struct DocumentController {
    manager: LinkManager,
    gateway: DocumentGateway,
    import: ImportSettings,
    renders: watch::Sender<u64>,
    queue: mpsc::Receiver<Message>,
}

impl DocumentController {
    /// Loads (or seeds) the document and starts the controller and its
    /// change forwarder. Must be called from within a tokio runtime.
    pub fn spawn(gateway: DocumentGateway, import: ImportSettings) -> Result<ControllerHandle, StorageError> {
        // Subscribe before loading so no write between the two is missed.
        let changes = gateway.subscribe();
        let document = gateway.load_or_seed()?;
        let view = gateway.load_active_view();
        let manager = LinkManager::new(document, view, &import.restored_container_name);

        let (sender, queue) = mpsc::channel(QUEUE_CAPACITY);
        let (renders, render_rx) = watch::channel(0u64);

        let forwarder = spawn_forwarder(gateway.clone(), changes, sender.downgrade());
        let controller = Self {
            manager,
            gateway,
            import,
            renders,
            queue,
        };
        tokio::spawn(controller.run(forwarder));

        Ok(ControllerHandle {
            sender,
            renders: render_rx,
        })
    }

    async fn run(mut self, forwarder: JoinHandle<()>) {
        info!("document controller started");
        while let Some(message) = self.queue.recv().await {
            match message {
                Message::Execute { command, reply } => {
                    let result = self.execute(command);
                    let _ = reply.send(result);
                }
                Message::ImportLinks { batch, links, reply } => {
                    let result = self.import_links(batch, links);
                    let _ = reply.send(result);
                }
                Message::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Message::RemoteChange { raw } => self.apply_remote(raw),
                Message::Resync => match self.gateway.store().get(self.gateway.document_key()) {
                    Ok(raw) => self.apply_remote(raw),
                    Err(e) => warn!("resync failed: {}", e),
                },
                Message::Shutdown => break,
            }
        }
        forwarder.abort();
        info!("document controller stopped");
    }

    fn execute(&mut self, command: Command) -> Result<CommandOutcome, ControllerError> {
        let persists_document = command.mutates_document();
        let outcome = self.manager.dispatch(command)?;
        if outcome != CommandOutcome::Unchanged {
            if persists_document {
                self.persist_document();
            }
            self.persist_view();
            self.bump_render();
        }
        Ok(outcome)
    }

    /// Imports into the active tab, or the first tab while the trash shows.
    /// Resolved here, at processing time, so a remote replacement queued
    /// earlier is already in effect.
    fn import_links(&mut self, batch: LinkBatch, links: Vec<Link>) -> Result<CommandOutcome, ControllerError> {
        let tab_id = match self.manager.active_view().tab_id() {
            Some(id) => id.to_string(),
            None => self
                .manager
                .document()
                .tabs
                .first()
                .map(|tab| tab.id.clone())
                .ok_or_else(|| LinkError::TabNotFound(String::new()))?,
        };
        let container_name = match batch {
            LinkBatch::Imported => self.import.imported_container_name.clone(),
            LinkBatch::Pulled => self.import.pulled_container_name.clone(),
        };
        self.execute(Command::ImportLinks {
            tab_id,
            container_name,
            links,
        })
    }

    fn snapshot(&self) -> DocumentSnapshot {
        let document = self.manager.document().clone();
        DocumentSnapshot {
            stats: DocumentStats::from(&document),
            document,
            active_view: self.manager.active_view().clone(),
            revision: *self.renders.borrow(),
        }
    }

    /// Last write wins: a valid remote document replaces ours unconditionally.
    fn apply_remote(&mut self, raw: Option<String>) {
        let Some(raw) = raw else {
            warn!("persisted document was deleted elsewhere; keeping the in-memory copy");
            return;
        };
        match DocumentGateway::decode(&raw) {
            Ok(document) => {
                if document == *self.manager.document() {
                    return;
                }
                info!("applying document changed in another process");
                let view_before = self.manager.active_view().clone();
                self.manager.replace_from_remote(document);
                if *self.manager.active_view() != view_before {
                    self.persist_view();
                }
                self.bump_render();
            }
            Err(e) => warn!("ignoring invalid remote document: {}", e),
        }
    }

    fn persist_document(&self) {
        if let Err(e) = self.gateway.save(self.manager.document()) {
            error!("failed to save document: {}", e);
        }
    }

    fn persist_view(&self) {
        if let Err(e) = self.gateway.save_active_view(self.manager.active_view()) {
            error!("failed to save active view: {}", e);
        }
    }

    fn bump_render(&self) {
        self.renders.send_modify(|revision| *revision += 1);
    }
}

/// Feeds remote document writes into the controller queue. Holds only a weak
/// sender so it never keeps the controller alive.
fn spawn_forwarder(
    gateway: DocumentGateway,
    mut changes: broadcast::Receiver<StorageChange>,
    sender: mpsc::WeakSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = match changes.recv().await {
                Ok(change) if gateway.is_remote_document_change(&change) => {
                    Message::RemoteChange { raw: change.value }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("missed {} storage notification(s); resyncing", skipped);
                    Message::Resync
                }
                Err(RecvError::Closed) => break,
            };
            let Some(sender) = sender.upgrade() else { break };
            if sender.send(message).await.is_err() {
                break;
            }
        }
        debug!("change forwarder stopped");
    })
}

/// Cloneable front end of the controller task.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<Message>,
    renders: watch::Receiver<u64>,
}

impl ControllerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| ControllerError::Stopped)?;
        response.await.map_err(|_| ControllerError::Stopped)
    }

    /// Runs one command through the dispatcher.
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, ControllerError> {
        self.request(|reply| Message::Execute { command, reply }).await?
    }

    pub async fn snapshot(&self) -> Result<DocumentSnapshot, ControllerError> {
        self.request(|reply| Message::Snapshot { reply }).await
    }

    /// Adds `links` as a new container in the active tab.
    pub async fn import_links(&self, batch: LinkBatch, links: Vec<Link>) -> Result<CommandOutcome, ControllerError> {
        self.request(|reply| Message::ImportLinks { batch, links, reply })
            .await?
    }

    /// Imports newline-delimited `title | url` text.
    pub async fn import_text(&self, text: &str) -> Result<CommandOutcome, ControllerError> {
        let links = parse_plain_text(text);
        debug!("plain text import parsed {} link(s)", links.len());
        self.import_links(LinkBatch::Imported, links).await
    }

    /// Imports the first list of a bookmark backup.
    pub async fn import_bookmarks(&self, text: &str) -> Result<CommandOutcome, ControllerError> {
        let links = parse_bookmark_backup(text)?;
        self.import_links(LinkBatch::Imported, links).await
    }

    /// Validates a whole document and merges it in or replaces the current one.
    /// A document failing validation changes nothing.
    pub async fn import_document(&self, json: &str, mode: ImportMode) -> Result<CommandOutcome, ControllerError> {
        let document = parse_document(json)?;
        self.apply_document(document, mode).await
    }

    /// Reads a backup file, then imports it like [`Self::import_document`].
    pub async fn import_file(&self, path: &Path, mode: ImportMode) -> Result<CommandOutcome, ControllerError> {
        let document = read_backup(path).await?;
        self.apply_document(document, mode).await
    }

    async fn apply_document(&self, document: Document, mode: ImportMode) -> Result<CommandOutcome, ControllerError> {
        let command = match mode {
            ImportMode::Merge => Command::MergeDocument { document },
            ImportMode::Replace => Command::ReplaceDocument { document },
        };
        self.execute(command).await
    }

    /// Receiver bumped after every change that needs a re-render.
    pub fn subscribe_renders(&self) -> watch::Receiver<u64> {
        self.renders.clone()
    }

    /// Stops the controller after the messages already queued.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(Message::Shutdown).await;
    }
}
