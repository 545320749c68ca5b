//! Export and import of whole documents as backup files.
//!
//! The backup format is the persisted document format, pretty-printed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::services::validation::parse_document;
use crate::types::document::Document;
use crate::types::errors::ImportError;

/// How an imported document is applied to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportMode {
    /// Id-based union; nothing existing is lost.
    Merge,
    /// The imported document replaces the current one.
    Replace,
}

/// `read-later-backup-YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("read-later-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Serializes the document in the backup/storage format.
pub fn export_document(doc: &Document) -> Result<String, ImportError> {
    serde_json::to_string_pretty(doc).map_err(|e| ImportError::InvalidJson(e.to_string()))
}

/// Writes a dated backup into `dir` and returns its path.
pub fn write_backup(dir: &Path, doc: &Document) -> Result<PathBuf, ImportError> {
    fs::create_dir_all(dir).map_err(|e| ImportError::Io(e.to_string()))?;
    let path = dir.join(backup_file_name(Local::now().date_naive()));
    let json = export_document(doc)?;
    fs::write(&path, json).map_err(|e| ImportError::Io(e.to_string()))?;
    Ok(path)
}

/// Reads and validates a backup file without touching any current state.
pub async fn read_backup(path: &Path) -> Result<Document, ImportError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ImportError::Io(format!("{}: {}", path.display(), e)))?;
    parse_document(&text)
}
