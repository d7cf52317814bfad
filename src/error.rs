//! Error types for the board, its stores and the settings cache.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors raised while loading, validating or persisting board data.
///
/// Drag-and-drop never produces one of these; an invalid drop is ignored.
#[derive(Debug, Error)]
pub enum BoardError {
    /// A required task field was absent or blank
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// A task field could not be parsed
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Two records share an identifier
    #[error("duplicate {item_type} ID: {id}")]
    DuplicateId { item_type: String, id: String },

    /// A task is assigned to a column the board does not have
    #[error("task '{task}' references unknown column '{column}'")]
    UnknownColumn { task: String, column: String },

    /// Task not found
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// No settings exist for the organization
    #[error("no settings for organization '{org}'")]
    SettingsNotFound { org: String },

    /// Config file could not be used
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate ID error
    pub fn duplicate_id(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            item_type: item_type.into(),
            id: id.into(),
        }
    }
}
