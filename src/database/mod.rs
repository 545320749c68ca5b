//! LaterList database layer.
//!
//! Provides SQLite connection management, schema migrations and the
//! SQLite-backed key-value store.
//!
//! # Usage
//!
//! ```no_run
//! use laterlist::database::SqliteStore;
//! use laterlist::services::persistence_gateway::KeyValueStore;
//!
//! let store = SqliteStore::open("laterlist.db").expect("failed to open database");
//! store.set("greeting", "hello", "docs").expect("write failed");
//! ```

pub mod connection;
pub mod kv_store;
pub mod migrations;

pub use connection::Database;
pub use kv_store::SqliteStore;
