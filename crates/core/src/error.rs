//! Error types and recovery strategies for Fabletime
//!
//! Each error carries a recovery action and a user-facing message.
//! Narration and recording failures live in `narration-engine`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation immediately
    RetryImmediate,
    /// Disable the failing feature and continue
    DisableFeature,
    /// Discard the stored value and fall back to defaults
    ResetToDefaults,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryImmediate => write!(f, "Retrying immediately"),
            Self::DisableFeature => write!(f, "Disabling feature"),
            Self::ResetToDefaults => write!(f, "Resetting to defaults"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Main error type for Fabletime
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Catalog Errors =====
    /// No story with this id in the catalog
    #[error("Story not found: {id}")]
    StoryNotFound { id: String },

    /// Catalog content violates an invariant (duplicate ids, empty text)
    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    /// Catalog file could not be parsed
    #[error("Failed to parse catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ===== Storage Errors =====
    /// Key-value store operation failed
    #[error("Storage error: {message}")]
    StorageError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value could not be decoded
    #[error("Stored value for '{key}' is corrupted: {reason}")]
    StorageCorrupted { key: String, reason: String },

    // ===== File System Errors =====
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::StorageError { .. } | Self::IoError { .. } => RecoveryAction::RetryImmediate,
            Self::StorageCorrupted { .. } => RecoveryAction::ResetToDefaults,
            Self::FileNotFound { .. } => RecoveryAction::DisableFeature,
            Self::StoryNotFound { .. } | Self::InvalidCatalog { .. } | Self::CatalogParse { .. } => {
                RecoveryAction::UserIntervention
            }
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::StoryNotFound { .. } => "That story isn't in the library.".to_string(),
            Self::InvalidCatalog { .. } | Self::CatalogParse { .. } => {
                "The story library could not be read.".to_string()
            }
            Self::StorageError { .. } => {
                "Your saved settings could not be updated. Please try again.".to_string()
            }
            Self::StorageCorrupted { .. } => {
                "Some saved settings were damaged and have been reset.".to_string()
            }
            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
        }
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        self.recovery_action() == RecoveryAction::RetryImmediate
    }

    /// Helper to create a storage error from any error type
    pub fn storage<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::StorageError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper for a missing story id
    pub fn story_not_found(id: impl fmt::Display) -> Self {
        Self::StoryNotFound { id: id.to_string() }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}
