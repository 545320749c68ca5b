use serde::{Deserialize, Serialize};

use super::document::{Document, Link};

/// A single user intent, produced by the UI layer and consumed by
/// `LinkManager::dispatch`.
///
/// Serialized as `{"kind": "<camelCase variant>", ...fields}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    AddTab {
        name: String,
    },
    DeleteTab {
        tab_id: String,
    },
    RenameTab {
        tab_id: String,
        name: String,
    },
    SwitchTab {
        tab_id: String,
    },
    ShowTrash,
    AddContainer {
        tab_id: String,
        name: String,
    },
    RenameContainer {
        container_id: String,
        name: String,
    },
    DeleteContainer {
        container_id: String,
    },
    MoveContainer {
        container_id: String,
        from_tab_id: String,
        to_tab_id: String,
        new_order: Vec<String>,
    },
    TrashAllInContainer {
        container_id: String,
    },
    AddLink {
        tab_id: String,
        container_id: String,
        url: String,
        #[serde(default)]
        title: String,
    },
    DeleteLink {
        link_id: String,
    },
    MoveToTrash {
        link_id: String,
    },
    RestoreFromTrash {
        link_id: String,
    },
    PermanentDelete {
        link_id: String,
    },
    EmptyTrash,
    MoveLink {
        link_id: String,
        from_tab_id: String,
        from_container_id: String,
        to_tab_id: String,
        to_container_id: String,
        dest_index: usize,
    },
    ImportLinks {
        tab_id: String,
        container_name: String,
        links: Vec<Link>,
    },
    ReplaceDocument {
        document: Document,
    },
    MergeDocument {
        document: Document,
    },
}

impl Command {
    /// Commands whose unresolved id is a silent no-op rather than a reported failure.
    pub fn ignores_missing_target(&self) -> bool {
        matches!(
            self,
            Command::DeleteLink { .. }
                | Command::MoveToTrash { .. }
                | Command::RestoreFromTrash { .. }
                | Command::PermanentDelete { .. }
        )
    }

    /// Whether a successful run changes the persisted document.
    ///
    /// View switches only touch session state.
    pub fn mutates_document(&self) -> bool {
        !matches!(self, Command::SwitchTab { .. } | Command::ShowTrash)
    }
}

/// Result of a successfully dispatched command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CommandOutcome {
    /// A new entity was created with this id.
    Created { id: String },
    /// The document (or view) changed.
    Updated,
    /// Nothing changed; nothing needs to be persisted.
    Unchanged,
}
