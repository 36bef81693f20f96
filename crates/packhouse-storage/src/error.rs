use std::path::PathBuf;
use thiserror::Error;

/// Storage-specific error types for the packing house inventory.
///
/// These errors represent failures in database operations, backup file
/// handling and data validation. Every operation surfaces them to its caller;
/// nothing is retried or silently defaulted.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection, query or transaction failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Unique constraint violated
    #[error("Duplicate key: {entity_type} with {field}={value} already exists")]
    DuplicateKey {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Backup payload does not have the expected shape
    #[error("Invalid backup format: {0}")]
    InvalidFormat(String),

    /// Backup file could not be read
    #[error("Failed to read backup file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup file could not be written
    #[error("Failed to write backup file {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Restore-latest requested with an empty backup ring
    #[error("No backups available")]
    EmptyBackupSet,

    /// JSON encoding or decoding of stored documents failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn not_found(entity_type: &str, field: &str, value: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Translate a unique-constraint violation into [`StorageError::DuplicateKey`].
    ///
    /// Any other database error is passed through unchanged.
    pub(crate) fn from_insert(
        err: sqlx::Error,
        entity_type: &str,
        field: &str,
        value: impl ToString,
    ) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StorageError::DuplicateKey {
                    entity_type: entity_type.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            _ => StorageError::Database(err),
        }
    }

    /// Returns `true` for [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Returns `true` for [`StorageError::DuplicateKey`].
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StorageError::DuplicateKey { .. })
    }
}

impl From<packhouse_core::Error> for StorageError {
    fn from(err: packhouse_core::Error) -> Self {
        StorageError::Validation(err.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
