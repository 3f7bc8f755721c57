//! Models without a parent: one table, implicit `id` primary key.

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::model_spec::{InheritanceStrategy, ModelSpec};
use crate::utils::naming::IMPLICIT_PK;

use super::{
    check_reserved_columns, resolve_derived, resolve_display_field, resolve_ordering,
    table_with_implicit_pk, InheritanceMapper, MapperContext, ResolvedModel,
};

pub struct ConcreteMapper;

impl InheritanceMapper for ConcreteMapper {
    fn strategy(&self) -> InheritanceStrategy {
        InheritanceStrategy::None
    }

    fn map(
        &self,
        model: &ModelSpec,
        ctx: &MapperContext<'_>,
    ) -> Result<ResolvedModel, ModelCatalogError> {
        check_reserved_columns(model, &[IMPLICIT_PK])?;

        let fields = model.fields.clone();
        let origins = vec![model.name.clone(); fields.len()];
        let ordering = resolve_ordering(model, &[], |name| {
            name == IMPLICIT_PK || fields.iter().any(|f| f.name == name)
        })?;
        let derived = resolve_derived(model, &[], &fields)?;
        let display_field = resolve_display_field(model, None, &fields)?;
        let table = table_with_implicit_pk(model, ctx, &fields, &origins);

        Ok(ResolvedModel {
            name: model.name.clone(),
            strategy: InheritanceStrategy::None,
            is_abstract: false,
            fields,
            origins,
            table: Some(table),
            storage: vec![model.name.clone()],
            key_columns: vec![IMPLICIT_PK.to_string()],
            ordering,
            derived,
            display_field,
        })
    }
}
