//! Tests for the cross-process tab pull protocol.

use std::sync::Arc;

use laterlist::services::persistence_gateway::{KeyValueStore, MemoryStore};
use laterlist::services::tab_collector::{PullOutcome, PulledTab, TabCollector, TabResponder};
use laterlist::types::settings::SyncSettings;
use tokio::task::JoinHandle;

fn sync() -> SyncSettings {
    SyncSettings {
        pull_settle_delay_ms: 100,
        ..SyncSettings::default()
    }
}

fn tab(title: &str, url: &str) -> PulledTab {
    PulledTab { title: title.to_string(), url: url.to_string() }
}

/// Answers the first pull request it sees with `tabs`.
fn spawn_responder(store: &Arc<dyn KeyValueStore>, origin: &str, tabs: Vec<PulledTab>) -> JoinHandle<()> {
    let responder = TabResponder::new(store.clone(), origin, &sync());
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            if let Some(request_id) = responder.pull_request(&change) {
                responder.respond(&request_id, &tabs).unwrap();
                break;
            }
        }
    })
}

#[tokio::test]
async fn test_pull_collects_from_every_responder() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = spawn_responder(&store, "window-a", vec![tab("A1", "https://a1.example"), tab("", "https://a2.example")]);
    let second = spawn_responder(&store, "window-b", vec![tab("B1", "https://b1.example")]);

    let collector = TabCollector::new(store.clone(), "collector", &sync());
    let outcome = collector.pull().await.unwrap();
    first.await.unwrap();
    second.await.unwrap();

    let PullOutcome::Collected(links) = outcome else {
        panic!("expected collected tabs");
    };
    let mut urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
    urls.sort();
    assert_eq!(urls, vec!["https://a1.example", "https://a2.example", "https://b1.example"]);
    // A blank title falls back to the url.
    assert!(links.iter().any(|l| l.title == "https://a2.example"));
    assert!(links.iter().all(|l| l.imported_at.is_some()));

    // Responses and the trigger are cleaned up.
    assert!(store.keys_with_prefix("readLaterPulledTab:").unwrap().is_empty());
    assert!(store.get("readLaterPullTabs").unwrap().is_none());
}

#[tokio::test]
async fn test_no_responders() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let collector = TabCollector::new(store.clone(), "collector", &sync());
    let outcome = collector.pull().await.unwrap();
    assert_eq!(outcome, PullOutcome::NoResponders);
    assert!(outcome.links().is_empty());
}

#[tokio::test]
async fn test_malformed_and_foreign_entries() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    // An entry for some older request must survive this pull.
    store.set("readLaterPulledTab:pull-old:x:0", r#"{"title":"Old","url":"https://old.example"}"#, "x").unwrap();

    let mut changes = store.subscribe();
    let writer = store.clone();
    let junk = tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            if change.key == "readLaterPullTabs" {
                if let Some(request_id) = change.value {
                    let key = format!("readLaterPulledTab:{}:junk:0", request_id);
                    writer.set(&key, "not json", "junk").unwrap();
                    break;
                }
            }
        }
    });

    let collector = TabCollector::new(store.clone(), "collector", &sync());
    assert_eq!(collector.pull().await.unwrap(), PullOutcome::NoResponders);
    junk.await.unwrap();

    let left = store.keys_with_prefix("readLaterPulledTab:").unwrap();
    assert_eq!(left, vec!["readLaterPulledTab:pull-old:x:0".to_string()]);
}

#[tokio::test]
async fn test_late_responses_are_not_collected() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let collector = TabCollector::new(store.clone(), "collector", &sync());
    let outcome = collector.pull().await.unwrap();
    assert_eq!(outcome, PullOutcome::NoResponders);

    // Answering after the window closed leaves an orphan nobody reads.
    let responder = TabResponder::new(store.clone(), "slow", &sync());
    responder.respond("pull-late", &[tab("Late", "https://late.example")]).unwrap();
    assert_eq!(store.keys_with_prefix("readLaterPulledTab:pull-late:").unwrap().len(), 1);
}
