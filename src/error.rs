//! Error taxonomy for letter generation.
//!
//! Precondition failures (missing fields, missing template, malformed annex
//! paste) are reported before any document is touched. Everything else is an
//! unexpected failure during document mutation or saving.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LetterError {
    /// One or more required form fields are empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The pasted annex table is not a rectangular tab-separated grid.
    #[error("malformed annex table (use TAB separators): {0}")]
    MalformedAnnex(String),

    #[error("invalid template: {reason}")]
    InvalidTemplate { reason: String },

    #[error("unknown {what}: '{value}'")]
    UnknownValue { what: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LetterError {
    /// True for failures the user can fix by correcting the input.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LetterError::MissingFields(_)
                | LetterError::TemplateNotFound(_)
                | LetterError::MalformedAnnex(_)
                | LetterError::UnknownValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LetterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_fields() {
        let err = LetterError::MissingFields(vec!["client name", "address"]);
        assert_eq!(err.to_string(), "missing required fields: client name, address");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_io_is_not_precondition() {
        let err = LetterError::from(std::io::Error::other("disk full"));
        assert!(!err.is_precondition());
    }
}
