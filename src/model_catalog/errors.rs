//! # Model Catalog Error Types
//!
//! Error handling for model registration, inheritance resolution and model
//! file loading.
//!
//! ## Error Categories
//!
//! - **Inheritance Errors**: field conflicts, proxy mutations, missing parent links
//! - **Registry Errors**: unknown, duplicate or unbound models
//! - **Configuration Errors**: file I/O and parsing issues while loading model files
//!
//! Every inheritance error is raised while schemas are built, never at query
//! time, and none of them is retryable.

use thiserror::Error;

use super::field_spec::FieldType;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelCatalogError {
    #[error(
        "Field `{field}` on model `{model}` conflicts with an inherited field (inherited type: {existing}, redefined type: {redefined})"
    )]
    DuplicateFieldConflict {
        model: String,
        field: String,
        existing: FieldType,
        redefined: FieldType,
    },
    #[error("Proxy model `{model}` cannot declare persisted field `{field}`")]
    InvalidProxyMutation { model: String, field: String },
    #[error("Multi-table model `{model}` has no parent link field to `{parent}`")]
    MissingParentLink { model: String, parent: String },
    #[error("No model registered under `{model}`")]
    UnregisteredModel { model: String },
    #[error("Model `{model}` is already registered")]
    DuplicateModel { model: String },
    #[error("Invalid parent for model `{model}`: {reason}")]
    InvalidParent { model: String, reason: String },
    #[error("Ordering field `{field}` is not a field of model `{model}`")]
    UnknownOrderingField { model: String, field: String },
    #[error("Invalid derived method `{method}` on model `{model}`: {reason}")]
    InvalidDerivedMethod {
        model: String,
        method: String,
        reason: String,
    },
    #[error("`{name}` is not a valid identifier")]
    InvalidIdentifier { name: String },
    #[error("Model `{model}` has not been bound to a schema yet")]
    NotSchemaBound { model: String },
    #[error("Model `{model}` is abstract and has no table to query")]
    AbstractModel { model: String },
    #[error("Failed to read model file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse model file: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid model file: {message}")]
    InvalidConfig { message: String },
}

/// Helper methods for creating errors with context information
impl ModelCatalogError {
    /// Create an UnregisteredModel error with context information
    ///
    /// # Example
    /// ```ignore
    /// ModelCatalogError::unregistered_with_context(
    ///     "Books",
    ///     "Parent of multi-table model `ISBN`"
    /// )
    /// ```
    pub fn unregistered_with_context(model: impl Into<String>, context: impl Into<String>) -> Self {
        ModelCatalogError::UnregisteredModel {
            model: format!("{}\n  Context: {}", model.into(), context.into()),
        }
    }

    /// Create an InvalidConfig error pointing at the offending model file
    pub fn config_error_with_context(
        config_path: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        ModelCatalogError::InvalidConfig {
            message: format!(
                "Configuration error in '{}'\n  Context: {}",
                config_path.into(),
                context.into()
            ),
        }
    }
}
