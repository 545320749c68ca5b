//! Unit tests for the RPC handler: every method dispatched by `handle_method`.
//!
//! These go through the same code path as the `laterlist-rpc` binary, over an
//! in-memory store and a temporary settings file.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use laterlist::app::App;
use laterlist::rpc_handler::handle_method;
use laterlist::services::persistence_gateway::{KeyValueStore, MemoryStore};
use laterlist::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use laterlist::services::tab_collector::{PulledTab, TabResponder};

/// Fresh app with a short pull window. Must be called inside a runtime.
fn setup() -> (App, Arc<dyn KeyValueStore>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();
    engine.set_value("sync.pull_settle_delay_ms", json!(50)).unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = App::with_store(engine, store.clone()).expect("Failed to init App");
    (app, store, tmp)
}

async fn call(app: &App, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).await.unwrap()
}

// ─── Basics ───

#[tokio::test]
async fn test_ping() {
    let (app, _store, _tmp) = setup();
    assert_eq!(call(&app, "ping", json!({})).await, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _store, _tmp) = setup();
    let err = handle_method(&app, "nonexistent.method", &json!({})).await.unwrap_err();
    assert!(err.contains("unknown method"));
}

// ─── Document ───

#[tokio::test]
async fn test_document_get_returns_seed() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "document.get", json!({})).await;
    assert_eq!(res["document"]["tabs"][0]["id"], "tab-1");
    assert_eq!(res["activeView"], "tab-1");
    assert_eq!(res["revision"], 0);
}

#[tokio::test]
async fn test_document_stats() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "document.stats", json!({})).await;
    assert_eq!(res, json!({"tabs": 2, "containers": 3, "links": 4, "trashed": 0}));
}

#[tokio::test]
async fn test_command_creates_and_renders() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "command", json!({"kind": "addTab", "name": "News"})).await;
    assert_eq!(res["outcome"], "created");
    let tab_id = res["id"].as_str().unwrap().to_string();

    let doc = call(&app, "document.get", json!({})).await;
    assert_eq!(doc["activeView"], tab_id.as_str());
    assert_eq!(doc["revision"], 1);
    assert_eq!(doc["document"]["tabs"][2]["name"], "News");
}

#[tokio::test]
async fn test_command_move_to_trash() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "command", json!({"kind": "moveToTrash", "linkId": "link-4"})).await;
    assert_eq!(res, json!({"outcome": "updated"}));
    let stats = call(&app, "document.stats", json!({})).await;
    assert_eq!(stats["trashed"], 1);
}

#[tokio::test]
async fn test_command_errors() {
    let (app, _store, _tmp) = setup();
    let err = handle_method(&app, "command", &json!({"kind": "fly"})).await.unwrap_err();
    assert!(err.contains("invalid command"));

    let err = handle_method(&app, "command", &json!({"kind": "renameTab", "tabId": "nope", "name": "X"}))
        .await
        .unwrap_err();
    assert!(err.contains("Tab not found"));

    let err = handle_method(&app, "command", &json!({"kind": "addTab", "name": "   "}))
        .await
        .unwrap_err();
    assert!(err.contains("empty"));
}

// ─── Import / export ───

#[tokio::test]
async fn test_import_text() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "import.text", json!({"text": "Rust | https://www.rust-lang.org\nhttps://crates.io"})).await;
    assert_eq!(res["outcome"], "created");

    let doc = call(&app, "document.get", json!({})).await;
    let containers = doc["document"]["tabs"][0]["containers"].as_array().unwrap();
    let imported = containers.last().unwrap();
    assert_eq!(imported["name"], "Imported");
    assert_eq!(imported["links"][0]["title"], "Rust");
    assert_eq!(imported["links"][1]["title"], "crates.io");
}

#[tokio::test]
async fn test_import_text_missing_param() {
    let (app, _store, _tmp) = setup();
    let err = handle_method(&app, "import.text", &json!({})).await.unwrap_err();
    assert_eq!(err, "missing text");
}

#[tokio::test]
async fn test_import_bookmarks() {
    let (app, _store, _tmp) = setup();
    let backup = json!({"lists": [{"cards": [{"title": "Docs", "url": "https://docs.rs"}]}]}).to_string();
    let res = call(&app, "import.bookmarks", json!({"text": backup})).await;
    assert_eq!(res["outcome"], "created");
    assert_eq!(call(&app, "document.stats", json!({})).await["links"], 5);

    let err = handle_method(&app, "import.bookmarks", &json!({"text": "{}"})).await.unwrap_err();
    assert!(err.contains("lists[0]"));
}

#[tokio::test]
async fn test_import_document_modes() {
    let (app, _store, _tmp) = setup();
    let other = json!({
        "tabs": [{"id": "t-x", "name": "Other", "containers": []}],
        "trash": []
    })
    .to_string();

    // Merge is the default.
    call(&app, "import.document", json!({"json": other})).await;
    assert_eq!(call(&app, "document.stats", json!({})).await["tabs"], 3);

    call(&app, "import.document", json!({"json": other, "mode": "replace"})).await;
    let stats = call(&app, "document.stats", json!({})).await;
    assert_eq!(stats, json!({"tabs": 1, "containers": 0, "links": 0, "trashed": 0}));
}

#[tokio::test]
async fn test_import_document_rejections() {
    let (app, _store, _tmp) = setup();
    let err = handle_method(&app, "import.document", &json!({})).await.unwrap_err();
    assert_eq!(err, "missing json or path");

    let err = handle_method(&app, "import.document", &json!({"json": "[]"})).await.unwrap_err();
    assert!(err.contains("Import"));

    let err = handle_method(&app, "import.document", &json!({"json": "{}", "mode": "sideways"}))
        .await
        .unwrap_err();
    assert!(err.contains("invalid mode"));

    assert_eq!(call(&app, "document.stats", json!({})).await["tabs"], 2);
}

#[tokio::test]
async fn test_export_document_content() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "export.document", json!({})).await;
    let name = res["fileName"].as_str().unwrap();
    assert!(name.starts_with("read-later-backup-") && name.ends_with(".json"));
    let parsed: Value = serde_json::from_str(res["content"].as_str().unwrap()).unwrap();
    assert_eq!(parsed["tabs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_export_to_dir_then_import_path() {
    let (app, _store, tmp) = setup();
    let dir = tmp.path().join("backups");
    let res = call(&app, "export.document", json!({"dir": dir.to_string_lossy()})).await;
    let path = res["path"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&path).exists());

    call(&app, "command", json!({"kind": "emptyTrash"})).await;
    call(&app, "command", json!({"kind": "deleteTab", "tabId": "tab-2"})).await;
    assert_eq!(call(&app, "document.stats", json!({})).await["tabs"], 1);

    call(&app, "import.document", json!({"path": path, "mode": "merge"})).await;
    assert_eq!(call(&app, "document.stats", json!({})).await["tabs"], 2);
}

// ─── Tab pull ───

#[tokio::test]
async fn test_tabs_pull_without_responders() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "tabs.pull", json!({})).await;
    assert_eq!(res["collected"], 0);
    assert!(res["message"].is_string());
}

#[tokio::test]
async fn test_tabs_pull_imports_into_pulled_container() {
    let (app, store, _tmp) = setup();
    let settings = app.settings().unwrap();
    let responder = TabResponder::new(store.clone(), "other-window", &settings.sync);
    let mut changes = store.subscribe();
    let answering = tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            if let Some(request_id) = responder.pull_request(&change) {
                let tabs = vec![PulledTab { title: "Blog".into(), url: "https://blog.rust-lang.org".into() }];
                responder.respond(&request_id, &tabs).unwrap();
                break;
            }
        }
    });

    let res = call(&app, "tabs.pull", json!({})).await;
    answering.await.unwrap();
    assert_eq!(res, json!({"collected": 1}));

    let doc = call(&app, "document.get", json!({})).await;
    let containers = doc["document"]["tabs"][0]["containers"].as_array().unwrap();
    let pulled = containers.last().unwrap();
    assert_eq!(pulled["name"], "Pulled Tabs");
    assert_eq!(pulled["links"][0]["url"], "https://blog.rust-lang.org");
}

#[tokio::test]
async fn test_tabs_respond_writes_entries() {
    let (app, store, _tmp) = setup();
    let res = call(
        &app,
        "tabs.respond",
        json!({"requestId": "pull-1", "tabs": [{"title": "A", "url": "https://a.example"}]}),
    )
    .await;
    assert_eq!(res, json!({"written": 1}));
    assert_eq!(store.keys_with_prefix("readLaterPulledTab:pull-1:").unwrap().len(), 1);

    let err = handle_method(&app, "tabs.respond", &json!({"requestId": "pull-1"})).await.unwrap_err();
    assert_eq!(err, "missing tabs");
}

// ─── Settings ───

#[tokio::test]
async fn test_settings_get_and_set() {
    let (app, _store, _tmp) = setup();
    let res = call(&app, "settings.get", json!({})).await;
    assert_eq!(res["sync"]["pull_settle_delay_ms"], 50);

    let res = call(&app, "settings.set", json!({"key": "import.merge_by_default", "value": false})).await;
    assert_eq!(res, json!({"ok": true, "restartRequired": true}));
    assert_eq!(call(&app, "settings.get", json!({})).await["import"]["merge_by_default"], false);

    let err = handle_method(&app, "settings.set", &json!({"key": "nope", "value": 1})).await.unwrap_err();
    assert!(err.contains("Invalid settings key"));
}

#[tokio::test]
async fn test_import_mode_follows_setting() {
    let (app, _store, _tmp) = setup();
    call(&app, "settings.set", json!({"key": "import.merge_by_default", "value": false})).await;
    let other = json!({"tabs": [{"id": "t-x", "name": "Other", "containers": []}], "trash": []}).to_string();
    call(&app, "import.document", json!({"json": other})).await;
    assert_eq!(call(&app, "document.stats", json!({})).await["tabs"], 1);
}
