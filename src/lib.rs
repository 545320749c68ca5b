//! LaterList: the data core of a read-later link organizer.
//!
//! Links live in containers, containers in tabs, and removed links in a
//! document-wide trash. The document is persisted in a shared key-value
//! store, kept in sync across processes, and can be merged with or replaced
//! by imported backups. This library crate exposes all modules for use by
//! the binaries and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
