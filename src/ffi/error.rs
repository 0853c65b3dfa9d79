// src/ffi/error.rs
use crate::errors::{DomainError, RemoteError, ServiceError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InternalError = 6,

    // Domain errors (200-299)
    EntityNotFound = 201,
    ValidationFailed = 204,
    Aborted = 209,

    // Service errors (300-399)
    NetworkError = 308,
    ConfigurationError = 310,
    ExternalServiceError = 311,
    NotInitialized = 312,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message, shown to the user as-is
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn null_pointer(name: &str) -> Self {
        Self::new(ErrorCode::NullPointer, &format!("{} must not be null", name))
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let details = serde_json::to_string(&err).ok();
        Self {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
            details,
        }
    }
}

impl From<RemoteError> for FFIError {
    fn from(err: RemoteError) -> Self {
        match &err {
            RemoteError::Rejected { status, message } => Self::with_details(
                ErrorCode::ExternalServiceError,
                message,
                &serde_json::json!({ "status": status }).to_string(),
            ),
            RemoteError::Network(_) => Self::new(ErrorCode::NetworkError, &err.to_string()),
            RemoteError::InvalidResponse(_) => {
                Self::new(ErrorCode::ExternalServiceError, &err.to_string())
            }
        }
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => e.into(),
            DomainError::Remote(e) => e.into(),
            DomainError::EntityNotFound(entity, id) => Self::with_details(
                ErrorCode::EntityNotFound,
                &format!("Entity not found: {} with ID {}", entity, id),
                &serde_json::json!({ "entity": entity, "id": id }).to_string(),
            ),
            DomainError::Aborted => Self::new(ErrorCode::Aborted, "Operation aborted"),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
            ServiceError::NotInitialized(msg) => Self::new(ErrorCode::NotInitialized, &msg),
        }
    }
}

pub type FFIResult<T> = Result<T, FFIError>;
