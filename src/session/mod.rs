//! Read/write path over a [`StorageEngine`].
//!
//! A [`Session`] turns model-level operations into table-level engine calls
//! using the registry's query plans:
//!
//! - `create` applies default-generation rules, validates, and inserts one
//!   row per storage table, root table first, so every child row can reuse
//!   the parent's primary key as its link
//! - `get`, `list` and `filter` read the leaf table joined to every ancestor
//! - `delete` removes the leaf row; the engine cascades to child tables
//!
//! Every operation requires the model to be queryable (see
//! [`crate::storage::migrate`]).

use chrono::Duration;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::model_catalog::errors::ModelCatalogError;
use crate::model_catalog::field_spec::{DefaultRule, FieldSpec};
use crate::model_catalog::model_spec::{DerivedKind, OrderingTerm};
use crate::model_catalog::registry::{ModelRegistry, ModelState};
use crate::model_catalog::table_schema::TableSchema;
use crate::query_planner::types::{OrderByItem, QueryPlan};
use crate::schema_mapper::ResolvedModel;
use crate::storage::{Filter, PrimaryKey, Result, Row, StorageEngine, StorageError, Value};

pub mod clock;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};

/// Result of evaluating a derived method
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    Duration(Duration),
    Text(String),
}

impl fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedValue::Duration(d) => write!(f, "{}", d),
            DerivedValue::Text(t) => f.write_str(t),
        }
    }
}

pub struct Session<'r, E: StorageEngine> {
    registry: &'r ModelRegistry,
    engine: E,
    clock: Arc<dyn Clock>,
}

impl<'r, E: StorageEngine> Session<'r, E> {
    pub fn new(registry: &'r ModelRegistry, engine: E) -> Self {
        Self::with_clock(registry, engine, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: &'r ModelRegistry, engine: E, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            engine,
            clock,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Insert a new instance of `model` and return its primary key.
    ///
    /// Multi-table models insert the root ancestor row first and pass its
    /// key down the chain. If a later insert fails, the rows already
    /// written are removed again.
    pub fn create(&mut self, model: &str, values: Row) -> Result<PrimaryKey> {
        let resolved = self.queryable(model)?;
        let tables = self.tables(model)?;

        let mut values = values;
        reject_generated(&resolved.fields, &values)?;
        let now = self.clock.now();
        for field in &resolved.fields {
            if field.default.is_generated() {
                values.insert(field.name.clone(), Value::Timestamp(now));
            }
        }
        let values = validation::validate_insert(&resolved.fields, values)?;

        let mut root: Option<(&TableSchema, PrimaryKey)> = None;
        for table in tables.iter().rev() {
            let mut table_row = columns_for(table, &values);
            if let Some((_, pk)) = root {
                table_row.insert(table.primary_key.clone(), Value::Integer(pk));
            }
            match self.engine.execute_write(table, table_row) {
                Ok(pk) => {
                    root.get_or_insert((table, pk));
                }
                Err(err) => {
                    if let Some((root_table, pk)) = root {
                        log::warn!(
                            "Insert into `{}` failed; removing row {} from `{}`",
                            table.name,
                            pk,
                            root_table.name
                        );
                        self.engine
                            .execute_delete(root_table, &Filter::eq(&root_table.primary_key, pk))?;
                    }
                    return Err(err);
                }
            }
        }

        let (_, pk) = root.ok_or_else(|| StorageError::MissingPrimaryKey {
            table: model.to_string(),
        })?;
        log::debug!("Created `{}` {}", model, pk);
        Ok(pk)
    }

    /// Insert only the leaf row of a multi-table model, linking it to an
    /// existing parent row.
    pub fn extend_parent(&mut self, model: &str, parent_pk: PrimaryKey, values: Row) -> Result<()> {
        let resolved = self.queryable(model)?;
        let tables = self.tables(model)?;
        let [leaf, _, ..] = tables.as_slice() else {
            return Err(ModelCatalogError::InvalidParent {
                model: model.to_string(),
                reason: "model has no parent table to extend".to_string(),
            }
            .into());
        };

        let own: Vec<FieldSpec> = resolved
            .fields
            .iter()
            .filter(|f| leaf.has_column(&f.name))
            .cloned()
            .collect();
        let mut values = values;
        reject_generated(&own, &values)?;
        let now = self.clock.now();
        for field in own.iter().filter(|f| f.default.is_generated()) {
            values.insert(field.name.clone(), Value::Timestamp(now));
        }
        let mut leaf_row = validation::validate_insert(&own, values)?;
        leaf_row.insert(leaf.primary_key.clone(), Value::Integer(parent_pk));

        let existing = self
            .engine
            .execute_query(leaf, &Filter::eq(&leaf.primary_key, parent_pk), &[])?;
        if !existing.is_empty() {
            return Err(StorageError::UniqueViolation {
                table: leaf.name.clone(),
                column: leaf.primary_key.clone(),
            });
        }
        self.engine.execute_write(leaf, leaf_row)?;
        Ok(())
    }

    /// Change some fields of an existing instance and return the updated row.
    ///
    /// Fields generated `now_on_update` are refreshed; generated fields
    /// cannot be set by the caller. If a table write fails, the tables
    /// already written get their previous row back.
    pub fn update(&mut self, model: &str, pk: PrimaryKey, values: Row) -> Result<Row> {
        let resolved = self.queryable(model)?;
        self.get(model, pk)?;

        reject_generated(&resolved.fields, &values)?;
        let mut values = validation::validate_partial(&resolved.fields, values)?;
        let now = self.clock.now();
        for field in &resolved.fields {
            if field.default == DefaultRule::NowOnUpdate {
                values.insert(field.name.clone(), Value::Timestamp(now));
            }
        }

        let mut written: Vec<(TableSchema, Row)> = Vec::new();
        for table in self.tables(model)? {
            let mut table_row = columns_for(&table, &values);
            if table_row.is_empty() {
                continue;
            }
            let previous = self
                .engine
                .execute_query(&table, &Filter::eq(&table.primary_key, pk), &[])?
                .into_iter()
                .next()
                .ok_or_else(|| StorageError::RowNotFound {
                    table: table.name.clone(),
                    pk,
                })?;
            table_row.insert(table.primary_key.clone(), Value::Integer(pk));
            if let Err(err) = self.engine.execute_write(&table, table_row) {
                for (done, row) in written.into_iter().rev() {
                    log::warn!(
                        "Update of `{}` failed; restoring row {} in `{}`",
                        table.name,
                        pk,
                        done.name
                    );
                    self.engine.execute_write(&done, row)?;
                }
                return Err(err);
            }
            written.push((table, previous));
        }
        self.get(model, pk)
    }

    /// Fetch one instance with every ancestor's columns merged in
    pub fn get(&self, model: &str, pk: PrimaryKey) -> Result<Row> {
        self.queryable(model)?;
        let plan = self.registry.resolve_query_plan(model, None)?;
        let base = plan_base(&plan)?;
        self.engine
            .execute_query(base, &Filter::eq(&base.primary_key, pk), &plan.joins)?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::RowNotFound {
                table: base.name.clone(),
                pk,
            })
    }

    /// Every instance, ordered by `ordering` or the model's default ordering
    pub fn list(&self, model: &str, ordering: Option<&[OrderingTerm]>) -> Result<Vec<Row>> {
        self.filter(model, &Filter::All, ordering)
    }

    pub fn filter(
        &self,
        model: &str,
        filter: &Filter,
        ordering: Option<&[OrderingTerm]>,
    ) -> Result<Vec<Row>> {
        self.queryable(model)?;
        let plan = self.registry.resolve_query_plan(model, ordering)?;
        let mut rows = self
            .engine
            .execute_query(plan_base(&plan)?, filter, &plan.joins)?;
        sort_rows(&mut rows, &plan.order_by);
        Ok(rows)
    }

    /// Delete one instance.
    ///
    /// Only the model's own row is removed; ancestor rows of a multi-table
    /// model stay, while child rows referencing it are cascaded by the
    /// engine.
    pub fn delete(&mut self, model: &str, pk: PrimaryKey) -> Result<()> {
        self.queryable(model)?;
        let tables = self.tables(model)?;
        let leaf = tables.first().ok_or_else(|| StorageError::MissingPrimaryKey {
            table: model.to_string(),
        })?;
        let removed = self
            .engine
            .execute_delete(leaf, &Filter::eq(&leaf.primary_key, pk))?;
        if removed == 0 {
            return Err(StorageError::RowNotFound {
                table: leaf.name.clone(),
                pk,
            });
        }
        log::debug!("Deleted `{}` {}", model, pk);
        Ok(())
    }

    /// Compute a derived method of `model` for a fetched row
    pub fn evaluate_derived(&self, model: &str, row: &Row, method: &str) -> Result<DerivedValue> {
        let resolved = self.registry.resolved(model)?;
        let derived = resolved.derived_method(method).ok_or_else(|| {
            ModelCatalogError::InvalidDerivedMethod {
                model: model.to_string(),
                method: method.to_string(),
                reason: "not declared on this model".to_string(),
            }
        })?;
        let source = derived.kind.source();
        let value = row.get(source).filter(|v| !v.is_null()).ok_or_else(|| {
            StorageError::validation(source, format!("no value to evaluate `{}`", method))
        })?;

        match &derived.kind {
            DerivedKind::Elapsed { .. } => {
                let at = value.as_timestamp().ok_or_else(|| {
                    StorageError::validation(source, "expected a timestamp")
                })?;
                Ok(DerivedValue::Duration(self.clock.now() - at))
            }
            DerivedKind::Display { .. } => Ok(DerivedValue::Text(value.to_string())),
        }
    }

    /// Text rendering of an instance: its display field, or
    /// `"<Model> object (<pk>)"` when none is set.
    pub fn display(&self, model: &str, row: &Row) -> Result<String> {
        let resolved = self.registry.resolved(model)?;
        if let Some(value) = resolved
            .display_field
            .as_ref()
            .and_then(|field| row.get(field))
            .filter(|v| !v.is_null())
        {
            return Ok(value.to_string());
        }
        let pk = resolved
            .key_columns
            .first()
            .and_then(|key| row.get(key))
            .cloned()
            .unwrap_or(Value::Null);
        Ok(format!("{} object ({})", model, pk))
    }

    fn queryable(&self, model: &str) -> Result<&'r ResolvedModel> {
        let registry: &'r ModelRegistry = self.registry;
        if registry.state(model)? != ModelState::Queryable {
            return Err(StorageError::NotQueryable {
                model: model.to_string(),
            });
        }
        Ok(registry.resolved(model)?)
    }

    fn tables(&self, model: &str) -> Result<Vec<TableSchema>> {
        Ok(self
            .registry
            .storage_tables(model)?
            .into_iter()
            .cloned()
            .collect())
    }
}

fn reject_generated(fields: &[FieldSpec], values: &Row) -> Result<()> {
    match fields
        .iter()
        .find(|f| f.default.is_generated() && values.contains_key(&f.name))
    {
        Some(field) => Err(StorageError::validation(
            &field.name,
            format!("value is generated ({:?}) and cannot be set", field.default),
        )),
        None => Ok(()),
    }
}

fn plan_base(plan: &QueryPlan) -> Result<&TableSchema> {
    plan.base_table().ok_or_else(|| {
        ModelCatalogError::AbstractModel {
            model: plan.model.clone(),
        }
        .into()
    })
}

fn columns_for(table: &TableSchema, values: &Row) -> Row {
    values
        .iter()
        .filter(|(name, _)| table.has_column(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn sort_rows(rows: &mut [Row], order_by: &[OrderByItem]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for item in order_by {
            let left = a.get(&item.column).unwrap_or(&Value::Null);
            let right = b.get(&item.column).unwrap_or(&Value::Null);
            let ord = if item.descending {
                right.sort_cmp(left)
            } else {
                left.sort_cmp(right)
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}
