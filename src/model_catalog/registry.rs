//! Model registry.
//!
//! Models are registered once at startup (`Declared`), bound to their table
//! schemas by the inheritance mappers (`SchemaBound`), and become `Queryable`
//! once their tables have been migrated. Nothing is mutated after that.
//!
//! A process-wide registry is available through [`GLOBAL_REGISTRY`] for
//! callers that do not want to thread a [`ModelRegistry`] value around.

use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use super::errors::ModelCatalogError;
use super::model_spec::{InheritanceStrategy, ModelSpec, OrderingTerm};
use super::table_schema::TableSchema;
use super::DEFAULT_APP_LABEL;
use crate::query_planner::{plan_query, QueryPlan};
use crate::schema_mapper::{mapper_for, MapperContext, ResolvedModel};
use crate::utils::naming::is_valid_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelState {
    Declared,
    SchemaBound,
    Queryable,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Declared => "declared",
            ModelState::SchemaBound => "schema-bound",
            ModelState::Queryable => "queryable",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct RegisteredModel {
    spec: ModelSpec,
    state: ModelState,
    resolved: Option<ResolvedModel>,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    app_label: String,
    /// Registration order; parents always precede their children
    order: Vec<String>,
    models: HashMap<String, RegisteredModel>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_APP_LABEL)
    }
}

impl ModelRegistry {
    pub fn new(app_label: impl Into<String>) -> Self {
        ModelRegistry {
            app_label: app_label.into(),
            order: Vec::new(),
            models: HashMap::new(),
        }
    }

    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Declare a model. Its parent, if any, must already be registered.
    pub fn register_model(&mut self, spec: ModelSpec) -> Result<(), ModelCatalogError> {
        if !is_valid_identifier(&self.app_label) {
            return Err(ModelCatalogError::InvalidIdentifier {
                name: self.app_label.clone(),
            });
        }
        spec.validate_shape()?;

        if self.models.contains_key(&spec.name) {
            return Err(ModelCatalogError::DuplicateModel { model: spec.name });
        }

        if let Some(parent_name) = &spec.parent {
            let parent = self.models.get(parent_name).ok_or_else(|| {
                ModelCatalogError::unregistered_with_context(
                    parent_name,
                    format!("Parent of {} model `{}`", spec.inheritance, spec.name),
                )
            })?;
            check_parent_kind(&spec, &parent.spec)?;
        }

        log::debug!(
            "Registered model `{}` ({} inheritance, {} field(s))",
            spec.name,
            spec.inheritance,
            spec.fields.len()
        );
        self.order.push(spec.name.clone());
        self.models.insert(
            spec.name.clone(),
            RegisteredModel {
                spec,
                state: ModelState::Declared,
                resolved: None,
            },
        );
        Ok(())
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Model names in registration order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn spec(&self, model: &str) -> Result<&ModelSpec, ModelCatalogError> {
        self.entry(model).map(|e| &e.spec)
    }

    pub fn state(&self, model: &str) -> Result<ModelState, ModelCatalogError> {
        self.entry(model).map(|e| e.state)
    }

    /// Bound view of a model
    pub fn resolved(&self, model: &str) -> Result<&ResolvedModel, ModelCatalogError> {
        self.entry(model)?
            .resolved
            .as_ref()
            .ok_or_else(|| ModelCatalogError::NotSchemaBound {
                model: model.to_string(),
            })
    }

    /// Run the model's inheritance mapper and return the tables it introduces.
    ///
    /// Abstract bases and proxies introduce none. Binding is idempotent and
    /// binds unbound ancestors first.
    pub fn build_schema(&mut self, model: &str) -> Result<Vec<TableSchema>, ModelCatalogError> {
        self.bind(model)?;
        Ok(self.resolved(model)?.table.iter().cloned().collect())
    }

    /// Bind every registered model; returns all tables in creation order
    pub fn build_all(&mut self) -> Result<Vec<TableSchema>, ModelCatalogError> {
        let names = self.order.clone();
        let mut tables = Vec::new();
        for name in &names {
            tables.extend(self.build_schema(name)?);
        }
        Ok(tables)
    }

    /// Every bound table, in creation order
    pub fn tables(&self) -> Vec<&TableSchema> {
        self.order
            .iter()
            .filter_map(|name| self.models.get(name))
            .filter_map(|e| e.resolved.as_ref())
            .filter_map(|r| r.table.as_ref())
            .collect()
    }

    /// Tables an instance of `model` is stored in, leaf first
    pub fn storage_tables(&self, model: &str) -> Result<Vec<&TableSchema>, ModelCatalogError> {
        let resolved = self.resolved(model)?;
        if !resolved.is_persisted() {
            return Err(ModelCatalogError::AbstractModel {
                model: model.to_string(),
            });
        }
        resolved
            .storage
            .iter()
            .map(|owner| {
                self.resolved(owner)?
                    .table
                    .as_ref()
                    .ok_or_else(|| ModelCatalogError::NotSchemaBound {
                        model: owner.clone(),
                    })
            })
            .collect()
    }

    /// Record that the model's tables exist in storage
    pub fn mark_queryable(&mut self, model: &str) -> Result<(), ModelCatalogError> {
        let resolved = self.resolved(model)?;
        if !resolved.is_persisted() {
            return Err(ModelCatalogError::AbstractModel {
                model: model.to_string(),
            });
        }
        if let Some(entry) = self.models.get_mut(model) {
            if entry.state != ModelState::Queryable {
                log::debug!("Model `{}` is now queryable", model);
                entry.state = ModelState::Queryable;
            }
        }
        Ok(())
    }

    /// Tables, join and ordering needed to read `model`.
    ///
    /// An explicit `ordering` replaces the model's default ordering.
    pub fn resolve_query_plan(
        &self,
        model: &str,
        ordering: Option<&[OrderingTerm]>,
    ) -> Result<QueryPlan, ModelCatalogError> {
        plan_query(self, model, ordering)
    }

    fn entry(&self, model: &str) -> Result<&RegisteredModel, ModelCatalogError> {
        self.models
            .get(model)
            .ok_or_else(|| ModelCatalogError::UnregisteredModel {
                model: model.to_string(),
            })
    }

    fn bind(&mut self, model: &str) -> Result<(), ModelCatalogError> {
        let entry = self.entry(model)?;
        if entry.state != ModelState::Declared {
            return Ok(());
        }
        let spec = entry.spec.clone();
        if let Some(parent) = &spec.parent {
            self.bind(parent)?;
        }

        let resolved = {
            let ctx = MapperContext {
                app_label: &self.app_label,
                registry: self,
            };
            mapper_for(&spec).map(&spec, &ctx)?
        };

        if let Some(table) = &resolved.table {
            if let Some(other) = self.tables().into_iter().find(|t| t.name == table.name) {
                return Err(ModelCatalogError::InvalidConfig {
                    message: format!(
                        "models `{}` and `{}` both map to table `{}`",
                        other.model, spec.name, table.name
                    ),
                });
            }
        }

        log::info!(
            "Bound model `{}` ({}): {} new table(s), stored in {:?}",
            spec.name,
            spec.inheritance,
            resolved.table.iter().count(),
            resolved.storage
        );
        if let Some(entry) = self.models.get_mut(model) {
            entry.resolved = Some(resolved);
            entry.state = ModelState::SchemaBound;
        }
        Ok(())
    }
}

/// Parent kinds each strategy accepts
fn check_parent_kind(spec: &ModelSpec, parent: &ModelSpec) -> Result<(), ModelCatalogError> {
    let reason = match spec.inheritance {
        InheritanceStrategy::AbstractMerge if !parent.is_abstract => {
            Some(format!("`{}` is not an abstract model", parent.name))
        }
        InheritanceStrategy::MultiTable if parent.is_abstract => Some(format!(
            "`{}` is abstract; extend it with abstract-merge instead",
            parent.name
        )),
        InheritanceStrategy::MultiTable if parent.inheritance == InheritanceStrategy::Proxy => {
            Some(format!("`{}` is a proxy and owns no table", parent.name))
        }
        InheritanceStrategy::Proxy if parent.is_abstract => {
            Some(format!("cannot proxy abstract model `{}`", parent.name))
        }
        _ => None,
    };
    match reason {
        Some(reason) => Err(ModelCatalogError::InvalidParent {
            model: spec.name.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

lazy_static! {
    /// Process-wide registry, populated once at startup
    pub static ref GLOBAL_REGISTRY: RwLock<ModelRegistry> = RwLock::new(ModelRegistry::default());
}

/// Replace the process-wide registry
pub fn initialize_global_registry(registry: ModelRegistry) {
    let mut global = GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    log::info!(
        "Initialized global model registry with {} model(s)",
        registry.order.len()
    );
    *global = registry;
}

/// Register a model in the process-wide registry
pub fn register_global_model(spec: ModelSpec) -> Result<(), ModelCatalogError> {
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .register_model(spec)
}

/// Bind every model in the process-wide registry
pub fn build_global_schemas() -> Result<Vec<TableSchema>, ModelCatalogError> {
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .build_all()
}

/// Read access to the process-wide registry
pub fn with_global_registry<R>(f: impl FnOnce(&ModelRegistry) -> R) -> R {
    let registry = GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&registry)
}
