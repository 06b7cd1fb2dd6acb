use thiserror::Error;

/// Failures reported by a [`StorageClient`](crate::domain::ports::StorageClient).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source read error: {0}")]
    SourceReadError(#[from] StorageError),

    #[error("Source decode error: {0}")]
    SourceDecodeError(#[source] std::io::Error),

    #[error("Upload error: {0}")]
    UploadError(#[source] StorageError),

    #[error("Local IO error: {0}")]
    LocalIoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, EtlError>;
