//! Abstract-base inheritance.
//!
//! An abstract base contributes fields, ordering and derived methods but never
//! gets a table. Each concrete model extending it gets one table holding the
//! base fields (in declared order) followed by its own.

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::field_spec::FieldSpec;
use crate::model_catalog::model_spec::{InheritanceStrategy, ModelSpec};
use crate::utils::naming::IMPLICIT_PK;

use super::{
    check_reserved_columns, resolve_derived, resolve_display_field, resolve_ordering,
    table_with_implicit_pk, InheritanceMapper, MapperContext, ResolvedModel,
};

pub struct AbstractBaseMapper;

impl InheritanceMapper for AbstractBaseMapper {
    fn strategy(&self) -> InheritanceStrategy {
        InheritanceStrategy::AbstractMerge
    }

    fn map(
        &self,
        model: &ModelSpec,
        ctx: &MapperContext<'_>,
    ) -> Result<ResolvedModel, ModelCatalogError> {
        let (mut fields, mut origins, inherited_ordering, inherited_derived, inherited_display) =
            match model.inheritance {
                InheritanceStrategy::AbstractMerge => {
                    let base = ctx.parent(model)?;
                    if !base.is_abstract {
                        return Err(ModelCatalogError::InvalidParent {
                            model: model.name.clone(),
                            reason: format!("`{}` is not an abstract model", base.name),
                        });
                    }
                    (
                        base.fields.clone(),
                        base.origins.clone(),
                        base.ordering.clone(),
                        base.derived.clone(),
                        base.display_field.clone(),
                    )
                }
                _ => (Vec::new(), Vec::new(), Vec::new(), Vec::new(), None),
            };

        check_reserved_columns(model, &[IMPLICIT_PK])?;
        merge_fields(model, &mut fields, &mut origins)?;

        let ordering = resolve_ordering(model, &inherited_ordering, |name| {
            name == IMPLICIT_PK || fields.iter().any(|f| f.name == name)
        })?;
        let derived = resolve_derived(model, &inherited_derived, &fields)?;
        let display_field = resolve_display_field(model, inherited_display.as_deref(), &fields)?;

        let (table, storage, key_columns) = if model.is_abstract {
            log::debug!("Abstract model `{}` gets no table", model.name);
            (None, Vec::new(), Vec::new())
        } else {
            let table = table_with_implicit_pk(model, ctx, &fields, &origins);
            log::debug!(
                "Merged {} field(s) into `{}` for model `{}`",
                fields.len(),
                table.name,
                model.name
            );
            (
                Some(table),
                vec![model.name.clone()],
                vec![IMPLICIT_PK.to_string()],
            )
        };

        Ok(ResolvedModel {
            name: model.name.clone(),
            strategy: model.inheritance,
            is_abstract: model.is_abstract,
            fields,
            origins,
            table,
            storage,
            key_columns,
            ordering,
            derived,
            display_field,
        })
    }
}

/// Union of inherited and own fields.
///
/// A redefinition with the same type replaces the inherited field in place;
/// a redefinition with a different type is a conflict.
fn merge_fields(
    model: &ModelSpec,
    fields: &mut Vec<FieldSpec>,
    origins: &mut Vec<String>,
) -> Result<(), ModelCatalogError> {
    for own in &model.fields {
        match fields.iter().position(|f| f.name == own.name) {
            Some(idx) if fields[idx].field_type != own.field_type => {
                return Err(ModelCatalogError::DuplicateFieldConflict {
                    model: model.name.clone(),
                    field: own.name.clone(),
                    existing: fields[idx].field_type,
                    redefined: own.field_type,
                });
            }
            Some(idx) => {
                fields[idx] = own.clone();
                origins[idx] = model.name.clone();
            }
            None => {
                fields.push(own.clone());
                origins.push(model.name.clone());
            }
        }
    }
    Ok(())
}
