use std::fmt;

// === LinkError ===

/// Errors raised by document mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Tab with the given ID was not found.
    TabNotFound(String),
    /// Container with the given ID was not found.
    ContainerNotFound(String),
    /// Link with the given ID was not found.
    LinkNotFound(String),
    /// A blank name was submitted for a tab or container.
    EmptyName,
    /// The tab is the only remaining one and cannot be deleted.
    LastTabProtected(String),
    /// The supplied data breaks a structural rule.
    Validation(String),
}

impl LinkError {
    /// True for the three "id no longer resolves" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LinkError::TabNotFound(_) | LinkError::ContainerNotFound(_) | LinkError::LinkNotFound(_)
        )
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            LinkError::ContainerNotFound(id) => write!(f, "Container not found: {}", id),
            LinkError::LinkNotFound(id) => write!(f, "Link not found: {}", id),
            LinkError::EmptyName => write!(f, "Name must not be empty"),
            LinkError::LastTabProtected(id) => {
                write!(f, "Cannot delete the last remaining tab: {}", id)
            }
            LinkError::Validation(msg) => write!(f, "Invalid document: {}", msg),
        }
    }
}

impl std::error::Error for LinkError {}

// === ImportError ===

/// Errors related to importing documents and foreign link formats.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The input is not valid JSON.
    InvalidJson(String),
    /// The JSON parsed but does not have the expected shape.
    Structure(String),
    /// Reading the import file failed.
    Io(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::InvalidJson(msg) => write!(f, "Import is not valid JSON: {}", msg),
            ImportError::Structure(msg) => write!(f, "Import failed validation: {}", msg),
            ImportError::Io(msg) => write!(f, "Import I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

// === StorageError ===

/// Errors related to the key-value persistence backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// Failed to serialize or deserialize a stored value.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === ControllerError ===

/// Errors surfaced by the document controller's handle.
#[derive(Debug)]
pub enum ControllerError {
    /// The controller task has shut down.
    Stopped,
    /// The command itself was rejected.
    Link(LinkError),
    /// An import could not be parsed or validated.
    Import(ImportError),
    /// Storage could not be read or written.
    Storage(StorageError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Stopped => write!(f, "Document controller has stopped"),
            ControllerError::Link(e) => write!(f, "{}", e),
            ControllerError::Import(e) => write!(f, "{}", e),
            ControllerError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControllerError::Stopped => None,
            ControllerError::Link(e) => Some(e),
            ControllerError::Import(e) => Some(e),
            ControllerError::Storage(e) => Some(e),
        }
    }
}

impl From<LinkError> for ControllerError {
    fn from(e: LinkError) -> Self {
        ControllerError::Link(e)
    }
}

impl From<ImportError> for ControllerError {
    fn from(e: ImportError) -> Self {
        ControllerError::Import(e)
    }
}

impl From<StorageError> for ControllerError {
    fn from(e: StorageError) -> Self {
        ControllerError::Storage(e)
    }
}
