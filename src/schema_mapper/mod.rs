//! Inheritance mappers.
//!
//! Each strategy turns a declared [`ModelSpec`] plus its already-resolved
//! parent into a [`ResolvedModel`]: the effective field set, the table the
//! model introduces (if any), the tables its rows live in, and the effective
//! ordering and derived methods.
//!
//! | Strategy        | New tables | Rows live in                   |
//! |-----------------|------------|--------------------------------|
//! | none            | 1          | own table                      |
//! | abstract base   | 0          | nowhere                        |
//! | abstract-merge  | 1          | own table (base fields merged) |
//! | multi-table     | 1          | own table + every ancestor     |
//! | proxy           | 0          | the proxied model's tables     |

use serde::Serialize;
use std::collections::HashSet;

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::field_spec::{FieldSpec, FieldType};
use crate::model_catalog::model_spec::{
    DerivedKind, DerivedMethod, InheritanceStrategy, ModelSpec, OrderingTerm,
};
use crate::model_catalog::registry::ModelRegistry;
use crate::model_catalog::table_schema::{ColumnSpec, TableSchema};
use crate::utils::naming::{table_name, IMPLICIT_PK};

pub mod abstract_base;
pub mod concrete;
pub mod multi_table;
pub mod proxy;

pub use abstract_base::AbstractBaseMapper;
pub use concrete::ConcreteMapper;
pub use multi_table::MultiTableMapper;
pub use proxy::ProxyMapper;

/// A model after its inheritance strategy has been applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModel {
    pub name: String,
    pub strategy: InheritanceStrategy,
    pub is_abstract: bool,
    /// Every persisted field visible on an instance, inherited fields first
    pub fields: Vec<FieldSpec>,
    /// Model that declared each entry of `fields`
    pub origins: Vec<String>,
    /// Table introduced by this model
    pub table: Option<TableSchema>,
    /// Models owning the tables an instance is stored in, leaf first
    pub storage: Vec<String>,
    /// Primary key columns of the storage tables, leaf first
    pub key_columns: Vec<String>,
    pub ordering: Vec<OrderingTerm>,
    pub derived: Vec<DerivedMethod>,
    pub display_field: Option<String>,
}

impl ResolvedModel {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is a field or key column an ordering may reference
    pub fn is_orderable(&self, name: &str) -> bool {
        name == IMPLICIT_PK
            || self.field(name).is_some()
            || self.key_columns.iter().any(|k| k == name)
    }

    pub fn derived_method(&self, name: &str) -> Option<&DerivedMethod> {
        self.derived.iter().find(|m| m.name == name)
    }

    pub fn is_persisted(&self) -> bool {
        !self.storage.is_empty()
    }
}

/// Read access to the registry while a model is being mapped
pub struct MapperContext<'a> {
    pub app_label: &'a str,
    pub registry: &'a ModelRegistry,
}

impl<'a> MapperContext<'a> {
    /// Resolved parent of `model`; parents are always bound before children
    pub fn parent(&self, model: &ModelSpec) -> Result<&'a ResolvedModel, ModelCatalogError> {
        let parent = model
            .parent
            .as_deref()
            .ok_or_else(|| ModelCatalogError::InvalidParent {
                model: model.name.clone(),
                reason: format!("{} inheritance requires a parent model", model.inheritance),
            })?;
        self.registry.resolved(parent)
    }

    pub fn table_name(&self, model: &ModelSpec) -> String {
        table_name(self.app_label, &model.name)
    }
}

pub trait InheritanceMapper {
    fn strategy(&self) -> InheritanceStrategy;

    fn map(
        &self,
        model: &ModelSpec,
        ctx: &MapperContext<'_>,
    ) -> Result<ResolvedModel, ModelCatalogError>;
}

/// Pick the mapper responsible for a model
pub fn mapper_for(model: &ModelSpec) -> &'static dyn InheritanceMapper {
    if model.is_abstract {
        return &AbstractBaseMapper;
    }
    match model.inheritance {
        InheritanceStrategy::None => &ConcreteMapper,
        InheritanceStrategy::AbstractMerge => &AbstractBaseMapper,
        InheritanceStrategy::MultiTable => &MultiTableMapper,
        InheritanceStrategy::Proxy => &ProxyMapper,
    }
}

/// Table with an implicit `id` primary key followed by `fields`
pub(crate) fn table_with_implicit_pk(
    model: &ModelSpec,
    ctx: &MapperContext<'_>,
    fields: &[FieldSpec],
    origins: &[String],
) -> TableSchema {
    let mut columns = vec![ColumnSpec::implicit_pk(&model.name)];
    columns.extend(
        fields
            .iter()
            .zip(origins)
            .map(|(field, origin)| ColumnSpec::from_field(field, origin.clone())),
    );
    TableSchema {
        name: ctx.table_name(model),
        model: model.name.clone(),
        columns,
        primary_key: IMPLICIT_PK.to_string(),
        foreign_keys: Vec::new(),
    }
}

/// A declared field may not shadow a generated key column
pub(crate) fn check_reserved_columns(
    model: &ModelSpec,
    reserved: &[&str],
) -> Result<(), ModelCatalogError> {
    for field in &model.fields {
        if reserved.contains(&field.name.as_str()) {
            return Err(ModelCatalogError::DuplicateFieldConflict {
                model: model.name.clone(),
                field: field.name.clone(),
                existing: FieldType::Integer,
                redefined: field.field_type,
            });
        }
    }
    Ok(())
}

/// Effective ordering: an explicit declaration strictly replaces the inherited one
pub(crate) fn resolve_ordering(
    model: &ModelSpec,
    inherited: &[OrderingTerm],
    is_orderable: impl Fn(&str) -> bool,
) -> Result<Vec<OrderingTerm>, ModelCatalogError> {
    let ordering = match &model.ordering {
        Some(own) => own.clone(),
        None => inherited.to_vec(),
    };
    for term in &ordering {
        if !is_orderable(&term.field) {
            return Err(ModelCatalogError::UnknownOrderingField {
                model: model.name.clone(),
                field: term.field.clone(),
            });
        }
    }
    Ok(ordering)
}

/// Inherited derived methods followed by the model's own; same name overrides
pub(crate) fn resolve_derived(
    model: &ModelSpec,
    inherited: &[DerivedMethod],
    fields: &[FieldSpec],
) -> Result<Vec<DerivedMethod>, ModelCatalogError> {
    let mut seen = HashSet::new();
    for method in &model.derived {
        if !seen.insert(method.name.as_str()) {
            return Err(ModelCatalogError::InvalidDerivedMethod {
                model: model.name.clone(),
                method: method.name.clone(),
                reason: "declared twice".to_string(),
            });
        }
        let source = method.kind.source();
        let field = fields.iter().find(|f| f.name == source).ok_or_else(|| {
            ModelCatalogError::InvalidDerivedMethod {
                model: model.name.clone(),
                method: method.name.clone(),
                reason: format!("source field `{}` does not exist", source),
            }
        })?;
        if matches!(method.kind, DerivedKind::Elapsed { .. })
            && field.field_type != FieldType::Timestamp
        {
            return Err(ModelCatalogError::InvalidDerivedMethod {
                model: model.name.clone(),
                method: method.name.clone(),
                reason: format!(
                    "elapsed time needs a timestamp source, `{}` is {}",
                    source, field.field_type
                ),
            });
        }
    }

    let mut derived: Vec<DerivedMethod> = inherited
        .iter()
        .filter(|m| !seen.contains(m.name.as_str()))
        .cloned()
        .collect();
    derived.extend(model.derived.iter().cloned());
    Ok(derived)
}

pub(crate) fn resolve_display_field(
    model: &ModelSpec,
    inherited: Option<&str>,
    fields: &[FieldSpec],
) -> Result<Option<String>, ModelCatalogError> {
    let display = model.display_field.as_deref().or(inherited);
    match display {
        Some(name) if !fields.iter().any(|f| f.name == name) => {
            Err(ModelCatalogError::InvalidConfig {
                message: format!(
                    "display field `{}` of model `{}` is not a field",
                    name, model.name
                ),
            })
        }
        other => Ok(other.map(str::to_string)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_dispatch() {
        let base = ModelSpec::new("BaseItem").abstract_base();
        assert_eq!(
            mapper_for(&base).strategy(),
            InheritanceStrategy::AbstractMerge
        );
        let proxy = ModelSpec::new("BookOrders").proxy_of("BookContent");
        assert_eq!(mapper_for(&proxy).strategy(), InheritanceStrategy::Proxy);
        let plain = ModelSpec::new("Books");
        assert_eq!(mapper_for(&plain).strategy(), InheritanceStrategy::None);
    }

    #[test]
    fn test_explicit_ordering_replaces_inherited() {
        let model = ModelSpec::new("BookOrders").ordering(["created"]);
        let ordering =
            resolve_ordering(&model, &[OrderingTerm::asc("title")], |_| true).unwrap();
        assert_eq!(ordering, vec![OrderingTerm::asc("created")]);
    }

    #[test]
    fn test_inherited_ordering_used_when_unset() {
        let model = ModelSpec::new("ItemB");
        let ordering =
            resolve_ordering(&model, &[OrderingTerm::asc("title")], |_| true).unwrap();
        assert_eq!(ordering, vec![OrderingTerm::asc("title")]);
    }

    #[test]
    fn test_elapsed_requires_timestamp_source() {
        let model = ModelSpec::new("Books").derived(DerivedMethod::elapsed("age", "title"));
        let fields = vec![FieldSpec::text("title")];
        assert!(matches!(
            resolve_derived(&model, &[], &fields),
            Err(ModelCatalogError::InvalidDerivedMethod { .. })
        ));
    }

    #[test]
    fn test_own_derived_overrides_inherited_by_name() {
        let fields = vec![FieldSpec::text("title"), FieldSpec::created_at("created")];
        let model = ModelSpec::new("Child").derived(DerivedMethod::display("label", "title"));
        let inherited = vec![
            DerivedMethod::elapsed("label", "created"),
            DerivedMethod::elapsed("age", "created"),
        ];
        let derived = resolve_derived(&model, &inherited, &fields).unwrap();
        assert_eq!(
            derived,
            vec![
                DerivedMethod::elapsed("age", "created"),
                DerivedMethod::display("label", "title"),
            ]
        );
    }
}
