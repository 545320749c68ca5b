//! LaterList RPC Server: JSON-RPC over stdin/stdout for a UI front end.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"command", "params":{"kind":"addTab","name":"News"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"documentChanged","revision":3}
//!           {"event":"pullRequested","requestId":"pull-..."}
//!
//! `LATERLIST_CONFIG` points at an alternative settings file and
//! `LATERLIST_DATA_DIR` relocates the database.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use laterlist::app::App;
use laterlist::rpc_handler::handle_method;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Emits `documentChanged` for every render revision and `pullRequested`
/// whenever another process asks for open tabs.
fn spawn_event_tasks(app: &App, out: mpsc::UnboundedSender<Value>) {
    let mut renders = app.controller.subscribe_renders();
    let render_out = out.clone();
    tokio::spawn(async move {
        while renders.changed().await.is_ok() {
            let revision = *renders.borrow_and_update();
            if render_out.send(json!({"event": "documentChanged", "revision": revision})).is_err() {
                break;
            }
        }
    });

    let mut changes = app.store.subscribe();
    let responder = app.responder.clone();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Some(request_id) = responder.pull_request(&change) {
                        if out.send(json!({"event": "pullRequested", "requestId": request_id})).is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(n)) => warn!("event stream skipped {} storage change(s)", n),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config_path = std::env::var("LATERLIST_CONFIG").ok();
    let app = match App::start(config_path).await {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!("failed to initialize LaterList: {}", e);
            std::process::exit(1);
        }
    };

    // Single writer keeps responses and events from interleaving mid-line.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = out_rx.recv().await {
            let line = format!("{}\n", message);
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let _ = out_tx.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    spawn_event_tasks(&app, out_tx.clone());

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            let _ = out_tx.send(json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let params = req.get("params").cloned().unwrap_or(json!({}));

        // Pulls wait out the settle window, so they are answered off the read
        // loop. Everything else runs inline to keep commands in order.
        if method == "tabs.pull" {
            let app = app.clone();
            let out = out_tx.clone();
            tokio::spawn(async move {
                let _ = out.send(respond(&app, id, &method, &params).await);
            });
        } else {
            let _ = out_tx.send(respond(&app, id, &method, &params).await);
        }
    }

    info!("stdin closed; shutting down");
    app.controller.shutdown().await;
    drop(out_tx);
    // Event tasks keep their senders alive; give the writer a moment to drain.
    let _ = tokio::time::timeout(Duration::from_millis(200), writer).await;
}

async fn respond(app: &App, id: Value, method: &str, params: &Value) -> Value {
    match handle_method(app, method, params).await {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    }
}
