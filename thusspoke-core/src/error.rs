//! Error types for the dialog engine.

use thiserror::Error;

/// Top-level error type for all engine operations.
///
/// Lookups of unknown NPCs are never errors; they are silent no-ops.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A message was constructed without a required field.
    #[error("Invalid message: {field} {reason}")]
    Validation {
        /// Which field failed validation (`conditions` or `text`).
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Encoded rule text could not be decoded, or a rule set cannot be encoded.
    #[error("Malformed rule text (record {record}): {reason}")]
    Format {
        /// Zero-based index of the offending record.
        record: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid NPC or engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "is required".to_string(),
        }
    }

    pub(crate) fn empty(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "must not be empty".to_string(),
        }
    }

    pub(crate) fn format(record: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            record,
            reason: reason.into(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;
