// ❗ Error taxonomy for the calculation core
//
// Errors are raised where input is parsed or validated. Nothing downstream
// of a validated value can fail, and nothing silently becomes zero.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A clock time that is not `H:MM` / `HH:MM` on a 24-hour clock
    #[error("invalid time format: {value:?} (expected HH:MM)")]
    InvalidFormat { value: String },

    /// A numeric amount or key that cannot enter an aggregate
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
}

impl CoreError {
    pub fn invalid_format(value: &str) -> Self {
        CoreError::InvalidFormat {
            value: value.to_string(),
        }
    }

    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
