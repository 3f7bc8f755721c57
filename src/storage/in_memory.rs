//! In-memory storage engine.
//!
//! Keeps every table in a `HashMap` keyed by table name, with rows ordered by
//! primary key. Suitable for tests and the CLI demo; nothing is persisted.

use std::collections::{BTreeMap, HashMap};

use crate::model_catalog::table_schema::{OnDelete, TableSchema};
use crate::query_planner::types::JoinSpec;

use super::error::{Result, StorageError};
use super::value::{Filter, PrimaryKey, Row, Value};
use super::StorageEngine;

#[derive(Debug, Clone)]
struct MemoryTable {
    schema: TableSchema,
    rows: BTreeMap<PrimaryKey, Row>,
    next_id: PrimaryKey,
}

impl MemoryTable {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// In-memory implementation of [`StorageEngine`].
///
/// Enforces primary keys, unique columns and foreign keys on write, and
/// follows `on_delete = cascade` foreign keys on delete.
///
/// # Example
/// ```ignore
/// let mut engine = MemoryEngine::new();
/// engine.execute_migration(&books)?;
/// let pk = engine.execute_write(&books, row([("title", Value::from("Dune"))]))?;
/// ```
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    tables: HashMap<String, MemoryTable>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(|t| t.rows.len())
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::MissingTable {
                table: name.to_string(),
            })
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StorageError::MissingTable {
                table: name.to_string(),
            })
    }

    fn check_foreign_keys(&self, schema: &TableSchema, row: &Row) -> Result<()> {
        for fk in &schema.foreign_keys {
            let Some(value) = row.get(&fk.column).and_then(Value::as_integer) else {
                continue;
            };
            let target = self.table(&fk.references_table)?;
            let exists = target
                .rows
                .values()
                .any(|r| r.get(&fk.references_column) == Some(&Value::Integer(value)));
            if !exists {
                return Err(StorageError::ForeignKeyViolation {
                    table: schema.name.clone(),
                    column: fk.column.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Remove the given rows and every row that references them through a
    /// cascading foreign key.
    fn delete_rows(&mut self, table: &str, pks: &[PrimaryKey]) -> Result<usize> {
        let removed: Vec<Row> = {
            let target = self.table_mut(table)?;
            pks.iter().filter_map(|pk| target.rows.remove(pk)).collect()
        };

        let referencing: Vec<(String, String, String)> = self
            .tables
            .values()
            .flat_map(|t| {
                t.schema
                    .references_to(table)
                    .filter(|fk| fk.on_delete == OnDelete::Cascade)
                    .map(|fk| {
                        (
                            t.schema.name.clone(),
                            fk.column.clone(),
                            fk.references_column.clone(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        for (child, column, references_column) in referencing {
            let keys: Vec<Value> = removed
                .iter()
                .filter_map(|r| r.get(&references_column).cloned())
                .collect();
            if keys.is_empty() {
                continue;
            }
            let filter = Filter::In { column, values: keys };
            let child_pks = self.matching_pks(&child, &filter)?;
            if !child_pks.is_empty() {
                log::debug!(
                    "Cascading delete of {} row(s) from `{}` to `{}`",
                    removed.len(),
                    table,
                    child
                );
                self.delete_rows(&child, &child_pks)?;
            }
        }
        Ok(removed.len())
    }

    fn matching_pks(&self, table: &str, filter: &Filter) -> Result<Vec<PrimaryKey>> {
        Ok(self
            .table(table)?
            .rows
            .iter()
            .filter(|(_, r)| filter.matches(r))
            .map(|(pk, _)| *pk)
            .collect())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemoryEngine {
    fn execute_query(
        &self,
        table: &TableSchema,
        filter: &Filter,
        joins: &[JoinSpec],
    ) -> Result<Vec<Row>> {
        let base = self.table(&table.name)?;
        let mut results = Vec::new();

        'rows: for stored in base.rows.values() {
            let mut merged = stored.clone();
            for join in joins {
                let Some(key) = merged.get(&join.left_column).cloned() else {
                    continue 'rows;
                };
                let right = self.table(&join.right_table)?;
                let Some(joined) = right
                    .rows
                    .values()
                    .find(|r| r.get(&join.right_column) == Some(&key))
                else {
                    continue 'rows;
                };
                for (column, value) in joined {
                    merged.entry(column.clone()).or_insert_with(|| value.clone());
                }
            }
            if filter.matches(&merged) {
                results.push(merged);
            }
        }
        Ok(results)
    }

    fn execute_write(&mut self, table: &TableSchema, mut row: Row) -> Result<PrimaryKey> {
        let schema = self.table(&table.name)?.schema.clone();
        if let Some(unknown) = row.keys().find(|c| !schema.has_column(c)) {
            return Err(StorageError::validation(
                unknown.as_str(),
                format!("no such column in `{}`", schema.name),
            ));
        }

        let pk = match row.get(&schema.primary_key) {
            Some(Value::Integer(pk)) => *pk,
            Some(other) if !other.is_null() => {
                return Err(StorageError::validation(
                    schema.primary_key.as_str(),
                    format!("primary key must be an integer, got {}", other.type_name()),
                ));
            }
            _ if schema.has_auto_pk() => self.table(&schema.name)?.next_id,
            _ => {
                return Err(StorageError::MissingPrimaryKey {
                    table: schema.name.clone(),
                })
            }
        };
        let next_id = pk.checked_add(1).ok_or_else(|| {
            StorageError::validation(schema.primary_key.as_str(), "primary key out of range")
        })?;
        row.insert(schema.primary_key.clone(), Value::Integer(pk));

        let merged = match self.table(&schema.name)?.rows.get(&pk) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.extend(row);
                merged
            }
            None => row,
        };

        self.check_foreign_keys(&schema, &merged)?;

        let target = self.table_mut(&schema.name)?;
        for column in schema
            .columns
            .iter()
            .filter(|c| c.constraints.unique && !c.primary_key)
        {
            let Some(value) = merged.get(&column.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = target
                .rows
                .iter()
                .any(|(other, r)| *other != pk && r.get(&column.name) == Some(value));
            if clash {
                return Err(StorageError::UniqueViolation {
                    table: schema.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        target.next_id = target.next_id.max(next_id);
        target.rows.insert(pk, merged);
        Ok(pk)
    }

    fn execute_delete(&mut self, table: &TableSchema, filter: &Filter) -> Result<usize> {
        let pks = self.matching_pks(&table.name, filter)?;
        self.delete_rows(&table.name, &pks)
    }

    fn execute_migration(&mut self, table: &TableSchema) -> Result<()> {
        for fk in &table.foreign_keys {
            if fk.references_table != table.name && !self.tables.contains_key(&fk.references_table)
            {
                return Err(StorageError::MissingTable {
                    table: fk.references_table.clone(),
                });
            }
        }

        match self.tables.get(&table.name) {
            Some(existing) if existing.schema == *table => {
                log::debug!("Table `{}` is up to date", table.name);
            }
            Some(existing) => {
                log::warn!(
                    "Recreating table `{}`; dropping {} row(s)",
                    table.name,
                    existing.rows.len()
                );
                self.tables
                    .insert(table.name.clone(), MemoryTable::new(table.clone()));
            }
            None => {
                log::info!("Created table `{}`", table.name);
                self.tables
                    .insert(table.name.clone(), MemoryTable::new(table.clone()));
            }
        }
        Ok(())
    }
}
