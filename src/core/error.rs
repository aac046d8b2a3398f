use thiserror::Error;
use std::sync::PoisonError;

/// Main error type for the AmethystKey secret store
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bucket already exists: {0}")]
    BucketExists(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Bucket creation failed: {0}")]
    BucketCreation(String),

    #[error("Secret already exists: {0}")]
    SecretExists(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl<T> From<PoisonError<T>> for ServiceError {
    fn from(err: PoisonError<T>) -> Self {
        ServiceError::LockError(err.to_string())
    }
}

/// Result type for the AmethystKey secret store
pub type Result<T> = std::result::Result<T, ServiceError>;
