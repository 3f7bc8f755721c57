use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::model_catalog::DEFAULT_APP_LABEL;
use crate::utils::naming::is_valid_identifier;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Runtime configuration for loading and migrating models
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Prefix for every table name (`<app_label>_<model>`)
    #[validate(
        length(min = 1, max = 63, message = "App label must be 1-63 characters"),
        custom(function = "validate_app_label")
    )]
    pub app_label: String,

    /// YAML model file loaded at startup
    #[validate(length(min = 1, message = "Models path cannot be empty"))]
    pub models_path: Option<String>,

    /// Emit `CREATE TABLE IF NOT EXISTS` instead of `CREATE TABLE`
    pub ddl_if_not_exists: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            app_label: DEFAULT_APP_LABEL.to_string(),
            models_path: None,
            ddl_if_not_exists: true,
        }
    }
}

impl OrmConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            app_label: env::var("ORMHERIT_APP_LABEL")
                .unwrap_or_else(|_| DEFAULT_APP_LABEL.to_string()),
            models_path: env::var("ORMHERIT_MODELS_PATH").ok(),
            ddl_if_not_exists: parse_env_var("ORMHERIT_DDL_IF_NOT_EXISTS", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation.
    ///
    /// Options not given on the command line fall back to `base`.
    pub fn from_cli(cli: CliConfig, base: &OrmConfig) -> Result<Self, ConfigError> {
        let config = Self {
            app_label: cli.app_label.unwrap_or_else(|| base.app_label.clone()),
            models_path: cli.models_path.or_else(|| base.models_path.clone()),
            ddl_if_not_exists: if cli.strict_create {
                false
            } else {
                base.ddl_if_not_exists
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with another configuration (`other` wins)
    pub fn merge(&mut self, other: Self) {
        self.app_label = other.app_label;
        if other.models_path.is_some() {
            self.models_path = other.models_path;
        }
        self.ddl_if_not_exists = other.ddl_if_not_exists;
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub app_label: Option<String>,
    pub models_path: Option<String>,
    /// Plain `CREATE TABLE` statements
    pub strict_create: bool,
}

fn validate_app_label(label: &str) -> Result<(), ValidationError> {
    if is_valid_identifier(label) {
        Ok(())
    } else {
        let mut err = ValidationError::new("app_label");
        err.message = Some("App label must be a valid identifier".into());
        Err(err)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
