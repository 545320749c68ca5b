//! LaterList console demo.
//!
//! Runs the read-later core against an in-memory store: seeds the default
//! collection, applies a few commands, imports text, merges a backup and
//! performs a tab pull with one simulated responder. `RUST_LOG=debug` shows
//! every dispatched command.

use std::error::Error;
use std::sync::Arc;

use laterlist::app::App;
use laterlist::managers::document_controller::DocumentSnapshot;
use laterlist::services::backup::{export_document, ImportMode};
use laterlist::services::persistence_gateway::{KeyValueStore, MemoryStore};
use laterlist::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use laterlist::services::tab_collector::{PullOutcome, PulledTab, TabResponder};
use laterlist::types::command::{Command, CommandOutcome};

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn print_document(snapshot: &DocumentSnapshot) {
    for tab in &snapshot.document.tabs {
        println!("  [{}] {}", tab.id, tab.name);
        for container in &tab.containers {
            println!("      {} ({} link(s))", container.name, container.links.len());
            for link in &container.links {
                println!("        - {} <{}>", link.title, link.url);
            }
        }
    }
    println!(
        "  {} tab(s), {} container(s), {} link(s), {} in trash",
        snapshot.stats.tabs, snapshot.stats.containers, snapshot.stats.links, snapshot.stats.trashed
    );
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!();
    println!("  LaterList v{}: demo mode", env!("CARGO_PKG_VERSION"));
    println!();

    let dir = std::env::temp_dir().join("laterlist-demo");
    let mut settings = SettingsEngine::new(Some(dir.join("settings.json").to_string_lossy().to_string()));
    settings.load()?;
    settings.set_value("sync.pull_settle_delay_ms", serde_json::json!(100))?;
    let sync = settings.get_settings().sync.clone();

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut app = App::with_store(settings, store.clone())?;

    section("Default collection");
    print_document(&app.controller.snapshot().await?);

    section("Commands");
    let outcome = app
        .controller
        .execute(Command::AddTab { name: "Research".to_string() })
        .await?;
    let tab_id = match outcome {
        CommandOutcome::Created { id } => id,
        other => return Err(format!("unexpected outcome {:?}", other).into()),
    };
    let container = app
        .controller
        .execute(Command::AddContainer { tab_id: tab_id.clone(), name: "Rust".to_string() })
        .await?;
    if let CommandOutcome::Created { id } = container {
        app.controller
            .execute(Command::AddLink {
                tab_id: tab_id.clone(),
                container_id: id,
                url: "https://doc.rust-lang.org/book/".to_string(),
                title: "The Rust Book".to_string(),
            })
            .await?;
    }
    // Container operations act on the active tab; go back to the seeded one.
    app.controller
        .execute(Command::SwitchTab { tab_id: "tab-1".to_string() })
        .await?;
    app.controller
        .execute(Command::DeleteContainer { container_id: "container-2".to_string() })
        .await?;
    println!("  Added tab {}, deleted \"Python\" (its links went to the trash)", tab_id);
    print_document(&app.controller.snapshot().await?);

    section("Plain text import");
    let text = "Tokio tutorial | https://tokio.rs/tokio/tutorial\nhttps://www.serde.rs\n\nnot a link";
    app.controller.import_text(text).await?;
    print_document(&app.controller.snapshot().await?);

    section("Backup merge");
    let backup = export_document(&app.controller.snapshot().await?.document)?;
    let outcome = app.controller.import_document(&backup, ImportMode::Merge).await?;
    println!("  Merging the current backup into itself: {:?}", outcome);
    println!();

    section("Tab pull");
    let responder = TabResponder::new(store.clone(), "demo-browser", &sync);
    let mut triggers = store.subscribe();
    let answering = tokio::spawn(async move {
        while let Ok(change) = triggers.recv().await {
            if let Some(request_id) = responder.pull_request(&change) {
                let tabs = vec![PulledTab {
                    title: "Hacker News".to_string(),
                    url: "https://news.ycombinator.com".to_string(),
                }];
                let _ = responder.respond(&request_id, &tabs);
                break;
            }
        }
    });
    match app.pull_tabs().await? {
        PullOutcome::Collected(links) => println!("  Pulled {} tab(s)", links.len()),
        PullOutcome::NoResponders => println!("  No open tabs were reported"),
    }
    answering.abort();
    print_document(&app.controller.snapshot().await?);

    app.shutdown().await;
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
