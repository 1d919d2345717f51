//! Error types for addon import and the store.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A manifest that failed the required-field checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a validation error with a complete, user-facing message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that fail a single source. They never abort the batch.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Network or filesystem failure, including timeouts.
    #[error("Failed to fetch '{source_label}': {reason}")]
    Fetch {
        /// Source as given by the user.
        source_label: String,
        /// Underlying cause.
        reason: String,
    },

    /// Bytes were not text, or text was not JSON.
    #[error("{0}")]
    Decode(String),

    /// Schema violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ImportError {
    /// Builds a fetch error for `source_label`.
    pub(crate) fn fetch(source_label: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            source_label: source_label.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors loading or saving the store file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file does not exist.
    #[error("storage file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid JSON.
    #[error("storage file was invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Root is not an object with a `profile` object.
    #[error("storage file missing 'profile' object.")]
    MissingProfile,

    /// `profile.addons` is absent or not an array.
    #[error("storage file missing 'addons' array.")]
    MissingAddons,

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// Returns true if the file simply does not exist yet.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
