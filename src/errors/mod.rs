mod error;

pub use error::{DomainError, RemoteError, ServiceError, ValidationError};

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
