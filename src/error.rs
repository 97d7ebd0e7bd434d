//! Error types for the bucket store and the operations built on it.

use thiserror::Error;

/// Storage-related errors raised by the bucket layer over the engine
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("incompatible value: {0}")]
    IncompatibleValue(String),

    #[error("store is open read-only")]
    ReadOnly,

    #[error("corrupt entry: {0}")]
    Corrupt(String),

    #[error("timed out waiting for store lock: {0}")]
    LockTimeout(String),

    #[error("{0}")]
    Engine(#[from] redb::Error),
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Engine(err.into())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Engine(err.into())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Engine(err.into())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Engine(err.into())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Engine(err.into())
    }
}

/// Operation-level errors surfaced to callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Encoding(err.to_string())
    }
}

/// Stable classification of every failure an operation can report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    InvalidOperation,
    Conflict,
    StoreError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidOperation => "InvalidOperation",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::StoreError => "StoreError",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::InvalidOperation => 4,
            ErrorKind::Conflict => 5,
            ErrorKind::StoreError => 6,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::BucketExists(_) | StorageError::IncompatibleValue(_) => {
                ErrorKind::Conflict
            }
            StorageError::BucketNotFound(_) => ErrorKind::NotFound,
            StorageError::ReadOnly => ErrorKind::InvalidOperation,
            StorageError::Corrupt(_) | StorageError::LockTimeout(_) | StorageError::Engine(_) => {
                ErrorKind::StoreError
            }
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidArgument(_) | ApiError::ConfigError(_) => ErrorKind::InvalidArgument,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::StorageError(e) => e.kind(),
            ApiError::Output(_) | ApiError::Encoding(_) => ErrorKind::StoreError,
        }
    }

    pub(crate) fn bucket_not_found(path: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("bucket not found: {}", path))
    }
}
