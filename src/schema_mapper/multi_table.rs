//! Multi-table inheritance.
//!
//! The child gets its own table holding only its own fields. Its primary key
//! is the parent link column, which is also a one-to-one foreign key to the
//! parent's primary key with `ON DELETE CASCADE`. An instance of the child is
//! the join of its row with every ancestor row.

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::field_spec::FieldType;
use crate::model_catalog::model_spec::{InheritanceStrategy, ModelSpec};
use crate::model_catalog::table_schema::{ColumnSpec, ForeignKey, OnDelete, TableSchema};
use crate::utils::naming::IMPLICIT_PK;

use super::{
    check_reserved_columns, resolve_derived, resolve_display_field, resolve_ordering,
    InheritanceMapper, MapperContext, ResolvedModel,
};

pub struct MultiTableMapper;

impl InheritanceMapper for MultiTableMapper {
    fn strategy(&self) -> InheritanceStrategy {
        InheritanceStrategy::MultiTable
    }

    fn map(
        &self,
        model: &ModelSpec,
        ctx: &MapperContext<'_>,
    ) -> Result<ResolvedModel, ModelCatalogError> {
        let parent = ctx.parent(model)?;
        let parent_table = parent
            .table
            .as_ref()
            .ok_or_else(|| ModelCatalogError::InvalidParent {
                model: model.name.clone(),
                reason: format!("`{}` has no table of its own to link to", parent.name),
            })?;
        let link = model
            .parent_link
            .as_deref()
            .ok_or_else(|| ModelCatalogError::MissingParentLink {
                model: model.name.clone(),
                parent: parent.name.clone(),
            })?;

        // The link column and the ancestors' key columns are generated
        let mut reserved: Vec<&str> = vec![link];
        reserved.extend(parent.key_columns.iter().map(String::as_str));
        if parent.key_columns.iter().any(|k| k == link) || parent.field(link).is_some() {
            return Err(ModelCatalogError::DuplicateFieldConflict {
                model: model.name.clone(),
                field: link.to_string(),
                existing: parent
                    .field(link)
                    .map(|f| f.field_type)
                    .unwrap_or(FieldType::Integer),
                redefined: FieldType::Integer,
            });
        }
        check_reserved_columns(model, &reserved)?;

        // Both rows are visible on one instance, so no name may repeat
        for own in &model.fields {
            if let Some(inherited) = parent.field(&own.name) {
                return Err(ModelCatalogError::DuplicateFieldConflict {
                    model: model.name.clone(),
                    field: own.name.clone(),
                    existing: inherited.field_type,
                    redefined: own.field_type,
                });
            }
        }

        let mut columns = vec![ColumnSpec::parent_link(link, &model.name)];
        columns.extend(
            model
                .fields
                .iter()
                .map(|field| ColumnSpec::from_field(field, &model.name)),
        );
        let table = TableSchema {
            name: ctx.table_name(model),
            model: model.name.clone(),
            columns,
            primary_key: link.to_string(),
            foreign_keys: vec![ForeignKey {
                column: link.to_string(),
                references_table: parent_table.name.clone(),
                references_column: parent_table.primary_key.clone(),
                on_delete: OnDelete::Cascade,
                one_to_one: true,
            }],
        };
        log::debug!(
            "Linked `{}`.{} -> `{}`.{} for model `{}`",
            table.name,
            link,
            parent_table.name,
            parent_table.primary_key,
            model.name
        );

        let mut fields = parent.fields.clone();
        fields.extend(model.fields.iter().cloned());
        let mut origins = parent.origins.clone();
        origins.extend(model.fields.iter().map(|_| model.name.clone()));

        let mut storage = vec![model.name.clone()];
        storage.extend(parent.storage.iter().cloned());
        let mut key_columns = vec![link.to_string()];
        key_columns.extend(parent.key_columns.iter().cloned());

        let ordering = resolve_ordering(model, &parent.ordering, |name| {
            name == IMPLICIT_PK
                || fields.iter().any(|f| f.name == name)
                || key_columns.iter().any(|k| k == name)
        })?;
        let derived = resolve_derived(model, &parent.derived, &fields)?;
        let display_field =
            resolve_display_field(model, parent.display_field.as_deref(), &fields)?;

        Ok(ResolvedModel {
            name: model.name.clone(),
            strategy: InheritanceStrategy::MultiTable,
            is_abstract: false,
            fields,
            origins,
            table: Some(table),
            storage,
            key_columns,
            ordering,
            derived,
            display_field,
        })
    }
}
