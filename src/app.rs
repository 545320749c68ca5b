//! App Core for LaterList.
//!
//! Wires the settings, the shared store, the document controller and the tab
//! pull endpoints together. There is no global instance: binaries build one
//! `App` and pass it by reference.

use std::error::Error;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use tokio::task::JoinHandle;

use crate::database::SqliteStore;
use crate::managers::document_controller::{ControllerHandle, DocumentController, LinkBatch};
use crate::services::persistence_gateway::{DocumentGateway, KeyValueStore};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::tab_collector::{PullOutcome, TabCollector, TabResponder};
use crate::types::errors::{ControllerError, SettingsError};
use crate::types::settings::LaterListSettings;

/// How often the SQLite store is checked for writes by other processes.
pub const EXTERNAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Central application struct.
pub struct App {
    pub settings_engine: Mutex<SettingsEngine>,
    pub store: Arc<dyn KeyValueStore>,
    pub gateway: DocumentGateway,
    pub controller: ControllerHandle,
    pub collector: TabCollector,
    pub responder: TabResponder,
    watcher: Option<JoinHandle<()>>,
}

impl App {
    /// Loads settings from `config_path` (or the platform default), opens the
    /// SQLite store and starts the controller.
    pub async fn start(config_path: Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        settings_engine.load()?;

        let db_path = settings_engine.database_path();
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("opening store at {}", db_path.display());
        let store = Arc::new(SqliteStore::open(&db_path)?);
        let watcher = store.spawn_watcher(EXTERNAL_POLL_INTERVAL);

        let mut app = Self::with_store(settings_engine, store)?;
        app.watcher = Some(watcher);
        Ok(app)
    }

    /// Builds an app over an existing store. Must run inside a tokio runtime.
    pub fn with_store(
        settings_engine: SettingsEngine,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, Box<dyn Error>> {
        let settings: LaterListSettings = settings_engine.get_settings().clone();
        let gateway = DocumentGateway::new(
            store.clone(),
            &settings.storage.document_key,
            &settings.storage.active_view_key,
        );
        let controller = DocumentController::spawn(gateway.clone(), settings.import.clone())?;
        let collector = TabCollector::new(store.clone(), gateway.origin(), &settings.sync);
        let responder = TabResponder::new(store.clone(), gateway.origin(), &settings.sync);

        Ok(Self {
            settings_engine: Mutex::new(settings_engine),
            store,
            gateway,
            controller,
            collector,
            responder,
            watcher: None,
        })
    }

    /// Current settings, cloned out of the engine.
    pub fn settings(&self) -> Result<LaterListSettings, SettingsError> {
        self.settings_engine
            .lock()
            .map(|engine| engine.get_settings().clone())
            .map_err(|e| SettingsError::IoError(e.to_string()))
    }

    /// Pulls open tabs from other processes into a new container of the
    /// active tab.
    pub async fn pull_tabs(&self) -> Result<PullOutcome, ControllerError> {
        let outcome = self.collector.pull().await?;
        if let PullOutcome::Collected(links) = &outcome {
            self.controller
                .import_links(LinkBatch::Pulled, links.clone())
                .await?;
        }
        Ok(outcome)
    }

    /// Stops the controller and the external change watcher.
    pub async fn shutdown(&mut self) {
        self.controller.shutdown().await;
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
