// LaterList state managers
// Managers own mutable state: the document mutation engine and the queue-driven controller around it.

pub mod document_controller;
pub mod link_manager;
