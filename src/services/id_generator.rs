//! Identifier generation for tabs, containers and links.
//!
//! Ids look like `link-<millis>-<sequence>-<random>`. The process-wide
//! sequence makes every id generated in this process distinct even when many
//! are requested within one clock tick; the clock and random parts keep them
//! apart from ids loaded out of storage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// The kind of entity an id is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Tab,
    Container,
    Link,
    /// Tab pull requests on the signaling channel.
    Request,
    /// Writers on the shared store.
    Origin,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Tab => "tab",
            IdKind::Container => "container",
            IdKind::Link => "link",
            IdKind::Request => "pull",
            IdKind::Origin => "origin",
        }
    }
}

/// Current UNIX time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Returns a new id for `kind`, unique within this process.
pub fn new_id(kind: IdKind) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{:x}-{}", kind.prefix(), now_millis(), seq, &random[..8])
}
