// LaterList services
// Services are stateless engines and storage-facing helpers: ids, validation, merge, import, backup, persistence, tab pull, settings.

pub mod backup;
pub mod id_generator;
pub mod import_adapters;
pub mod merge_engine;
pub mod persistence_gateway;
pub mod settings_engine;
pub mod tab_collector;
pub mod validation;
