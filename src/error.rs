// ⚠️ Error Taxonomy
// Typed failures raised by the ranking core

use thiserror::Error;

/// Errors raised while building entries or configuration.
///
/// "Subgroup too small to form a team" is not an error: `aggregate()`
/// returns `None` for it. Empty selections are plain empty vectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// A row is missing a mandatory field or carries a bad value.
    #[error("invalid row (bib {bib}): {field}: {message}")]
    Validation {
        bib: String,
        field: &'static str,
        message: String,
    },

    /// A time string matches neither `ss.cc` nor `mm:ss.cc`.
    #[error("invalid time format: {0:?}")]
    Format(String),

    /// Report configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RaceError {
    pub fn validation(bib: &str, field: &'static str, message: impl Into<String>) -> Self {
        RaceError::Validation {
            bib: bib.to_string(),
            field,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RaceError::Validation { .. })
    }
}

pub type RaceResult<T> = std::result::Result<T, RaceError>;
