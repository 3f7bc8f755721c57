use thiserror::Error;

use crate::model_catalog::errors::ModelCatalogError;

/// Result type for storage and write-path operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage engines and the session write path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    /// Table was never migrated into this engine
    #[error("Table `{table}` does not exist (run migrations first)")]
    MissingTable { table: String },

    #[error("No row with primary key {pk} in `{table}`")]
    RowNotFound { table: String, pk: i64 },

    #[error("Unique constraint violated on {table}.{column}")]
    UniqueViolation { table: String, column: String },

    #[error("Foreign key {table}.{column} references missing row {value}")]
    ForeignKeyViolation {
        table: String,
        column: String,
        value: i64,
    },

    #[error("Row for `{table}` has no primary key")]
    MissingPrimaryKey { table: String },

    /// A value failed field validation
    #[error("Invalid value for `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Model `{model}` is not queryable (run migrations first)")]
    NotQueryable { model: String },

    #[error(transparent)]
    Catalog(#[from] ModelCatalogError),
}

impl StorageError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
