use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain validation failed for `{field}`: {message}")]
    Validation { field: &'static str, message: String },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Name of the input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            DomainError::Validation { field, .. } => field,
        }
    }

    /// Human-readable message without the field prefix.
    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation { message, .. } => message,
        }
    }
}
