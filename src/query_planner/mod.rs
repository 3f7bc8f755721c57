//! Query plan resolution.
//!
//! Given a bound model, decide which tables an instance is read from, how
//! they are joined, and how rows are ordered:
//!
//! - plain and abstract-merge models read their single table
//! - multi-table models read their own table and inner-join every ancestor
//!   through the parent link columns
//! - proxies read the proxied model's tables with the proxy's ordering

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::model_spec::OrderingTerm;
use crate::model_catalog::registry::ModelRegistry;

pub mod types;

pub use types::{JoinKind, JoinSpec, OrderByItem, QueryPlan};

pub fn plan_query(
    registry: &ModelRegistry,
    model: &str,
    ordering: Option<&[OrderingTerm]>,
) -> Result<QueryPlan, ModelCatalogError> {
    let resolved = registry.resolved(model)?;
    let tables: Vec<_> = registry
        .storage_tables(model)?
        .into_iter()
        .cloned()
        .collect();

    let mut joins = Vec::with_capacity(tables.len().saturating_sub(1));
    for pair in tables.windows(2) {
        let (child, parent) = (&pair[0], &pair[1]);
        let fk = child
            .references_to(&parent.name)
            .next()
            .ok_or_else(|| ModelCatalogError::MissingParentLink {
                model: child.model.clone(),
                parent: parent.model.clone(),
            })?;
        joins.push(JoinSpec {
            kind: JoinKind::Inner,
            left_table: child.name.clone(),
            left_column: fk.column.clone(),
            right_table: parent.name.clone(),
            right_column: fk.references_column.clone(),
        });
    }

    let terms = ordering.unwrap_or(resolved.ordering.as_slice());
    let mut order_by = Vec::with_capacity(terms.len());
    for term in terms {
        let table = tables
            .iter()
            .find(|t| t.has_column(&term.field))
            .filter(|_| resolved.is_orderable(&term.field))
            .ok_or_else(|| ModelCatalogError::UnknownOrderingField {
                model: model.to_string(),
                field: term.field.clone(),
            })?;
        order_by.push(OrderByItem {
            table: table.name.clone(),
            column: term.field.clone(),
            descending: term.descending,
        });
    }

    log::debug!(
        "Planned `{}`: tables {:?}, {} join(s), order by {:?}",
        model,
        tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        joins.len(),
        terms.iter().map(ToString::to_string).collect::<Vec<_>>()
    );

    Ok(QueryPlan {
        model: model.to_string(),
        tables,
        joins,
        order_by,
        derived: resolved.derived.clone(),
    })
}
