use serde::{Deserialize, Serialize};

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LaterListSettings {
    pub storage: StorageSettings,
    pub sync: SyncSettings,
    pub import: ImportSettings,
}

/// Where and under which keys the document is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// SQLite file; `None` means the platform data directory.
    pub database_path: Option<String>,
    pub document_key: String,
    pub active_view_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            document_key: "readLaterData".to_string(),
            active_view_key: "readLaterActiveTab".to_string(),
        }
    }
}

/// Cross-process tab pull protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub pull_trigger_key: String,
    pub pull_response_prefix: String,
    pub pull_settle_delay_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            pull_trigger_key: "readLaterPullTabs".to_string(),
            pull_response_prefix: "readLaterPulledTab:".to_string(),
            pull_settle_delay_ms: 1000,
        }
    }
}

/// Names given to containers created by restore and import paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportSettings {
    pub restored_container_name: String,
    pub pulled_container_name: String,
    pub imported_container_name: String,
    #[serde(default = "default_true")]
    pub merge_by_default: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            restored_container_name: "Restored Items".to_string(),
            pulled_container_name: "Pulled Tabs".to_string(),
            imported_container_name: "Imported".to_string(),
            merge_by_default: true,
        }
    }
}
