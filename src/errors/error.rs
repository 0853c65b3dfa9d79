use std::fmt;
use serde::Serialize;
use thiserror::Error;

/// Errors reported by the remote API (activities, condominiums)
#[derive(Debug, Error, Clone, Serialize, PartialEq)]
pub enum RemoteError {
    /// Non-2xx response. `message` comes from the `{error}` body when the backend sent one.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Generic text used when a rejected response carries no usable body
    pub fn generic_message(status: u16) -> String {
        format!("Server returned error {}", status)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The operation was superseded or its consumer went away.
    #[error("Operation aborted")]
    Aborted,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Service-level errors (application specific)
#[derive(Debug, Error, Clone, Serialize, PartialEq)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Library not initialized: {0}")]
    NotInitialized(String),
}

impl ServiceError {
    /// Text shown to the user as-is. Backend messages pass through untouched.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Domain(DomainError::Validation(e)) => e.to_string(),
            ServiceError::Domain(DomainError::Remote(e)) => e.to_string(),
            ServiceError::Domain(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::Aborted))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::EntityNotFound(..)))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(error: ValidationError) -> Self {
        ServiceError::Domain(DomainError::Validation(error))
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, Serialize, PartialEq)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' must be at least {min}")]
    Min {
        field: String,
        min: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn min<T: fmt::Display>(field: &str, min: T) -> Self {
        Self::Min {
            field: field.to_string(),
            min: min.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
