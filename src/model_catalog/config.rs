//! Model file loading.
//!
//! Models are declared in YAML with the following structure:
//!
//! ```yaml
//! app_label: orm              # Optional table-name prefix
//! models:
//!   - name: BaseItem
//!     abstract: true
//!     ordering: [title]
//!     display_field: title
//!     fields:
//!       - { name: title, type: text, max_length: 255 }
//!       - { name: created, type: timestamp, default: now_on_create }
//!   - name: ItemA
//!     inheritance: abstract-merge
//!     parent: BaseItem
//!     ordering: [-created]
//!     fields:
//!       - { name: content, type: text }
//! ```
//!
//! Models must be listed parents first, as they would be declared in code.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::errors::ModelCatalogError;
use super::model_spec::ModelSpec;
use super::registry::ModelRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFileConfig {
    /// Overrides the configured app label when present
    #[serde(default)]
    pub app_label: Option<String>,
    pub models: Vec<ModelSpec>,
}

impl ModelFileConfig {
    /// Load and structurally validate a model file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelCatalogError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| ModelCatalogError::ConfigReadError {
            error: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&yaml).map_err(|e| match e {
            ModelCatalogError::InvalidConfig { message } => {
                ModelCatalogError::config_error_with_context(path.display().to_string(), message)
            }
            other => other,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelCatalogError> {
        let config: ModelFileConfig =
            serde_yaml::from_str(yaml).map_err(|e| ModelCatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that need the whole file but no registry
    pub fn validate(&self) -> Result<(), ModelCatalogError> {
        if self.models.is_empty() {
            return Err(ModelCatalogError::InvalidConfig {
                message: "model file declares no models".to_string(),
            });
        }

        let mut declared = HashSet::new();
        for model in &self.models {
            if let Some(parent) = &model.parent {
                if !declared.contains(parent.as_str()) {
                    return Err(ModelCatalogError::InvalidConfig {
                        message: format!(
                            "model `{}` is listed before its parent `{}`",
                            model.name, parent
                        ),
                    });
                }
            }
            if !declared.insert(model.name.as_str()) {
                return Err(ModelCatalogError::InvalidConfig {
                    message: format!("model `{}` is declared twice", model.name),
                });
            }
        }
        Ok(())
    }

    /// Register every model and bind all schemas.
    ///
    /// `default_app_label` is used unless the file sets its own.
    pub fn to_registry(&self, default_app_label: &str) -> Result<ModelRegistry, ModelCatalogError> {
        let app_label = self.app_label.as_deref().unwrap_or(default_app_label);
        let mut registry = ModelRegistry::new(app_label);
        for model in &self.models {
            registry.register_model(model.clone())?;
        }
        let tables = registry.build_all()?;
        log::info!(
            "Loaded {} model(s) into {} table(s) under app label `{}`",
            self.models.len(),
            tables.len(),
            app_label
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BOOKS_YAML: &str = r#"
models:
  - name: Books
    fields:
      - { name: title, type: text, max_length: 100 }
      - { name: created, type: timestamp, default: now_on_create }
  - name: ISBN
    inheritance: multi-table
    parent: Books
    parent_link: books_ptr
    fields:
      - { name: ISBN, type: text }
"#;

    #[test]
    fn test_from_yaml_str_to_registry() {
        let config = ModelFileConfig::from_yaml_str(BOOKS_YAML).unwrap();
        let registry = config.to_registry("orm").unwrap();
        let tables: Vec<&str> = registry.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["orm_books", "orm_isbn"]);
    }

    #[test]
    fn test_file_app_label_wins() {
        let yaml = format!("app_label: library\n{}", BOOKS_YAML);
        let config = ModelFileConfig::from_yaml_str(&yaml).unwrap();
        let registry = config.to_registry("orm").unwrap();
        assert_eq!(registry.app_label(), "library");
        assert!(registry.tables().iter().any(|t| t.name == "library_isbn"));
    }

    #[test]
    fn test_child_before_parent_rejected() {
        let yaml = r#"
models:
  - name: ISBN
    inheritance: multi-table
    parent: Books
    parent_link: books_ptr
  - name: Books
"#;
        assert!(matches!(
            ModelFileConfig::from_yaml_str(yaml),
            Err(ModelCatalogError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            ModelFileConfig::from_yaml_str("models: [ {name: "),
            Err(ModelCatalogError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BOOKS_YAML.as_bytes()).unwrap();
        let config = ModelFileConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.models.len(), 2);

        assert!(matches!(
            ModelFileConfig::from_yaml_file("/definitely/not/here.yaml"),
            Err(ModelCatalogError::ConfigReadError { .. })
        ));
    }
}
