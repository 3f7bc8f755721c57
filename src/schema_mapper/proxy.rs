//! Proxy models.
//!
//! A proxy reads and writes the proxied model's tables unchanged. It may only
//! replace the default ordering and add derived methods.

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::model_spec::{InheritanceStrategy, ModelSpec};

use super::{
    resolve_derived, resolve_display_field, resolve_ordering, InheritanceMapper, MapperContext,
    ResolvedModel,
};

pub struct ProxyMapper;

impl InheritanceMapper for ProxyMapper {
    fn strategy(&self) -> InheritanceStrategy {
        InheritanceStrategy::Proxy
    }

    fn map(
        &self,
        model: &ModelSpec,
        ctx: &MapperContext<'_>,
    ) -> Result<ResolvedModel, ModelCatalogError> {
        if let Some(field) = model.fields.first() {
            return Err(ModelCatalogError::InvalidProxyMutation {
                model: model.name.clone(),
                field: field.name.clone(),
            });
        }

        let base = ctx.parent(model)?;
        if !base.is_persisted() {
            return Err(ModelCatalogError::InvalidParent {
                model: model.name.clone(),
                reason: format!("cannot proxy abstract model `{}`", base.name),
            });
        }

        let ordering = resolve_ordering(model, &base.ordering, |name| base.is_orderable(name))?;
        let derived = resolve_derived(model, &base.derived, &base.fields)?;
        let display_field =
            resolve_display_field(model, base.display_field.as_deref(), &base.fields)?;

        log::debug!(
            "Proxy `{}` reuses the storage of `{}` ({} table(s))",
            model.name,
            base.name,
            base.storage.len()
        );

        Ok(ResolvedModel {
            name: model.name.clone(),
            strategy: InheritanceStrategy::Proxy,
            is_abstract: false,
            fields: base.fields.clone(),
            origins: base.origins.clone(),
            table: None,
            storage: base.storage.clone(),
            key_columns: base.key_columns.clone(),
            ordering,
            derived,
            display_field,
        })
    }
}
