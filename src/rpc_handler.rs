//! RPC method handler for the LaterList JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdin/stdout.
//! `handle_method` maps a method name and its params onto the `App`.

use std::path::Path;

use chrono::Local;
use serde_json::{json, Value};

use crate::app::App;
use crate::services::backup::{backup_file_name, export_document, write_backup, ImportMode};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::tab_collector::{PullOutcome, PulledTab};
use crate::types::command::Command;

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// `params.mode` when present, else the configured default.
fn import_mode(app: &App, params: &Value) -> Result<ImportMode, String> {
    match params.get("mode") {
        Some(mode) => serde_json::from_value(mode.clone()).map_err(|e| format!("invalid mode: {}", e)),
        None => {
            let settings = app.settings().map_err(|e| e.to_string())?;
            Ok(if settings.import.merge_by_default {
                ImportMode::Merge
            } else {
                ImportMode::Replace
            })
        }
    }
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Document ───
        "document.get" => {
            let snapshot = app.controller.snapshot().await.map_err(|e| e.to_string())?;
            serde_json::to_value(snapshot).map_err(|e| e.to_string())
        }
        "document.stats" => {
            let snapshot = app.controller.snapshot().await.map_err(|e| e.to_string())?;
            serde_json::to_value(snapshot.stats).map_err(|e| e.to_string())
        }
        "command" => {
            let command: Command =
                serde_json::from_value(params.clone()).map_err(|e| format!("invalid command: {}", e))?;
            let outcome = app.controller.execute(command).await.map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }

        // ─── Import / export ───
        "import.text" => {
            let text = str_param(params, "text")?;
            let outcome = app.controller.import_text(text).await.map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }
        "import.bookmarks" => {
            let text = str_param(params, "text")?;
            let outcome = app.controller.import_bookmarks(text).await.map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }
        "import.document" => {
            let mode = import_mode(app, params)?;
            let outcome = match (params.get("json").and_then(|v| v.as_str()), params.get("path").and_then(|v| v.as_str())) {
                (Some(json), _) => app.controller.import_document(json, mode).await,
                (None, Some(path)) => app.controller.import_file(Path::new(path), mode).await,
                (None, None) => return Err("missing json or path".to_string()),
            }
            .map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }
        "export.document" => {
            let snapshot = app.controller.snapshot().await.map_err(|e| e.to_string())?;
            match params.get("dir").and_then(|v| v.as_str()) {
                Some(dir) => {
                    let path = write_backup(Path::new(dir), &snapshot.document).map_err(|e| e.to_string())?;
                    Ok(json!({"path": path.to_string_lossy()}))
                }
                None => {
                    let content = export_document(&snapshot.document).map_err(|e| e.to_string())?;
                    Ok(json!({
                        "fileName": backup_file_name(Local::now().date_naive()),
                        "content": content,
                    }))
                }
            }
        }

        // ─── Tab pull ───
        "tabs.pull" => match app.pull_tabs().await.map_err(|e| e.to_string())? {
            PullOutcome::Collected(links) => Ok(json!({"collected": links.len()})),
            PullOutcome::NoResponders => Ok(json!({"collected": 0, "message": "No open tabs were reported"})),
        },
        "tabs.respond" => {
            let request_id = str_param(params, "requestId")?;
            let tabs: Vec<PulledTab> = params
                .get("tabs")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| format!("invalid tabs: {}", e))?
                .ok_or("missing tabs")?;
            let written = app.responder.respond(request_id, &tabs).map_err(|e| e.to_string())?;
            Ok(json!({"written": written}))
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings().map_err(|e| e.to_string())?;
            serde_json::to_value(settings).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut engine = app.settings_engine.lock().map_err(|e| e.to_string())?;
            engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "restartRequired": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
