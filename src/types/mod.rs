// LaterList shared type definitions
// Each submodule defines types used across the application.

pub mod command;
pub mod document;
pub mod errors;
pub mod settings;
