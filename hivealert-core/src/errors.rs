use thiserror::Error;

/// Result type used across the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while bootstrapping process-wide facilities.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
