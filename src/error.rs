//! Error type shared by every wizard operation.
//!
//! Validation failures are not errors: they are reported as data through
//! [`crate::validation::ValidationReport`]. `WizardError` covers the cases where
//! an operation cannot be carried out at all.

use thiserror::Error;

use crate::field::FieldIndex;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Settings or display configuration are incomplete or malformed
    #[error("Invalid wizard configuration: {0}")]
    Config(String),

    /// No field with this index is present in the form
    #[error("No field with index {0}")]
    UnknownField(FieldIndex),

    /// An attribute or element name that the template does not declare
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// A value was assigned to a control that cannot hold one.
    /// This always indicates a mismatch between template and data.
    #[error("Unsupported input type '{kind}' for element '{identifier}'")]
    UnsupportedInput { identifier: String, kind: String },

    /// A value that does not belong to the closed set of an enumerated input
    #[error("Invalid value '{value}' for '{attribute}'")]
    InvalidValue { attribute: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WizardError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_value(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
