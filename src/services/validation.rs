//! Structural validation for loaded and imported documents.
//!
//! Checks run against the raw JSON so that a missing field is reported with
//! its path (`tabs[0].name`) instead of a generic deserialization error.
//! Any violation rejects the whole payload.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::document::{Document, Link};
use crate::types::errors::ImportError;

fn structure(msg: String) -> ImportError {
    ImportError::Structure(msg)
}

fn require_array<'a>(value: &'a Value, field: &str, path: &str) -> Result<&'a Vec<Value>, ImportError> {
    value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| structure(format!("{}.{} must be an array", path, field)))
}

fn require_string(value: &Value, field: &str, path: &str) -> Result<(), ImportError> {
    match value.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err(structure(format!("{}.{} must be a non-empty string", path, field))),
    }
}

fn validate_link(link: &Value, path: &str) -> Result<(), ImportError> {
    require_string(link, "id", path)?;
    require_string(link, "title", path)?;
    require_string(link, "url", path)?;
    if let Some(ts) = link.get("importedAt") {
        if !ts.is_null() && !ts.is_i64() && !ts.is_u64() {
            return Err(structure(format!("{}.importedAt must be a number", path)));
        }
    }
    Ok(())
}

/// Validates the document shape of `value` without converting it.
pub fn validate_document(value: &Value) -> Result<(), ImportError> {
    if !value.is_object() {
        return Err(structure("document must be an object".to_string()));
    }
    let tabs = require_array(value, "tabs", "document")?;
    let trash = require_array(value, "trash", "document")?;

    for (ti, tab) in tabs.iter().enumerate() {
        let tab_path = format!("tabs[{}]", ti);
        require_string(tab, "id", &tab_path)?;
        require_string(tab, "name", &tab_path)?;
        let containers = require_array(tab, "containers", &tab_path)?;

        for (ci, container) in containers.iter().enumerate() {
            let container_path = format!("{}.containers[{}]", tab_path, ci);
            require_string(container, "id", &container_path)?;
            require_string(container, "name", &container_path)?;
            let links = require_array(container, "links", &container_path)?;

            for (li, link) in links.iter().enumerate() {
                validate_link(link, &format!("{}.links[{}]", container_path, li))?;
            }
        }
    }

    for (li, link) in trash.iter().enumerate() {
        validate_link(link, &format!("trash[{}]", li))?;
    }

    Ok(())
}

/// Rejects documents where any id appears twice.
pub fn check_unique_ids(doc: &Document) -> Result<(), ImportError> {
    let mut seen = HashSet::new();
    for id in doc.all_ids() {
        if !seen.insert(id) {
            return Err(structure(format!("duplicate id: {}", id)));
        }
    }
    Ok(())
}

fn require_field(value: &str, field: &str, path: &str) -> Result<(), ImportError> {
    if value.is_empty() {
        return Err(structure(format!("{}.{} must be a non-empty string", path, field)));
    }
    Ok(())
}

/// Applies the link rules to a typed `Link`.
pub fn check_link(link: &Link, path: &str) -> Result<(), ImportError> {
    require_field(&link.id, "id", path)?;
    require_field(&link.title, "title", path)?;
    require_field(&link.url, "url", path)
}

/// Applies the same rules as [`validate_document`] to a typed `Document`,
/// plus the duplicate-id check. Used for documents that arrive already
/// deserialized, such as command payloads.
pub fn check_document(doc: &Document) -> Result<(), ImportError> {
    for (ti, tab) in doc.tabs.iter().enumerate() {
        let tab_path = format!("tabs[{}]", ti);
        require_field(&tab.id, "id", &tab_path)?;
        require_field(&tab.name, "name", &tab_path)?;
        for (ci, container) in tab.containers.iter().enumerate() {
            let container_path = format!("{}.containers[{}]", tab_path, ci);
            require_field(&container.id, "id", &container_path)?;
            require_field(&container.name, "name", &container_path)?;
            for (li, link) in container.links.iter().enumerate() {
                check_link(link, &format!("{}.links[{}]", container_path, li))?;
            }
        }
    }
    for (li, link) in doc.trash.iter().enumerate() {
        check_link(link, &format!("trash[{}]", li))?;
    }
    check_unique_ids(doc)
}

/// Converts an already-parsed JSON value into a validated `Document`.
pub fn document_from_value(value: Value) -> Result<Document, ImportError> {
    validate_document(&value)?;
    let doc: Document =
        serde_json::from_value(value).map_err(|e| ImportError::Structure(e.to_string()))?;
    check_unique_ids(&doc)?;
    Ok(doc)
}

/// Parses and validates a JSON document.
pub fn parse_document(text: &str) -> Result<Document, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
    document_from_value(value)
}
