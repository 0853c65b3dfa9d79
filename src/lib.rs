// Public modules
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod validation;

pub use config::AppConfig;
pub use errors::{ServiceError, ServiceResult};

// Entry point for initialization
/// Initialize the library with the given configuration.
/// This function must be called before any other function in the library.
pub async fn initialize(config: AppConfig) -> ServiceResult<()> {
    globals::initialize(config).await
}

/// Initialize from `CRONOGRAMA_*` environment variables, loading `.env` when present.
pub async fn initialize_from_env() -> ServiceResult<()> {
    initialize(AppConfig::from_env()?).await
}
