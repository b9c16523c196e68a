use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanerError {
    /// Driver error, passed through untouched.
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("Configuration error: {message}")]
    Config { message: String },
    #[error("Refusing to clean database: {message}")]
    Unsafe { message: String },
}

impl CleanerError {
    pub fn config(message: impl Into<String>) -> Self {
        CleanerError::Config {
            message: message.into(),
        }
    }

    pub fn unsafe_target(message: impl Into<String>) -> Self {
        CleanerError::Unsafe {
            message: message.into(),
        }
    }
}
