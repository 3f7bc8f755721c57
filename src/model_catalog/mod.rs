pub mod config;
pub mod errors;
pub mod field_spec;
pub mod model_spec;
pub mod registry;
pub mod table_schema;

/// Table-name prefix used when neither the configuration nor the model file sets one
pub const DEFAULT_APP_LABEL: &str = "orm";

// Re-export commonly used types
pub use config::ModelFileConfig;
pub use errors::ModelCatalogError;
pub use field_spec::{DefaultRule, FieldConstraints, FieldSpec, FieldType};
pub use model_spec::{DerivedKind, DerivedMethod, InheritanceStrategy, ModelSpec, OrderingTerm};
pub use registry::{
    build_global_schemas, initialize_global_registry, register_global_model,
    with_global_registry, ModelRegistry, ModelState, GLOBAL_REGISTRY,
};
pub use table_schema::{ColumnSpec, ForeignKey, OnDelete, TableSchema};
