//! Storage engine abstraction.
//!
//! The catalog and query planner only decide *which* tables to touch; a
//! [`StorageEngine`] performs the reads, writes, deletes and migrations.
//! [`MemoryEngine`] is the bundled implementation.

use crate::model_catalog::registry::ModelRegistry;
use crate::model_catalog::table_schema::TableSchema;
use crate::query_planner::types::JoinSpec;

pub mod error;
pub mod in_memory;
pub mod value;

pub use error::{Result, StorageError};
pub use in_memory::MemoryEngine;
pub use value::{row, Filter, PrimaryKey, Row, Value};

/// Physical storage consumed by the session layer.
///
/// Engines are expected to enforce primary-key and unique constraints and
/// to honour `on_delete = cascade` foreign keys.
pub trait StorageEngine {
    /// Read rows of `table` matching `filter`.
    ///
    /// Each join inner-joins the row of `right_table` whose `right_column`
    /// equals the current row's `left_column`; joined columns are merged into
    /// the returned row. The filter is evaluated against the merged row.
    fn execute_query(&self, table: &TableSchema, filter: &Filter, joins: &[JoinSpec])
        -> Result<Vec<Row>>;

    /// Insert `row`, or update the existing row when its primary key is
    /// already present. Returns the row's primary key.
    fn execute_write(&mut self, table: &TableSchema, row: Row) -> Result<PrimaryKey>;

    /// Delete rows of `table` matching `filter`, cascading to referencing
    /// tables. Returns the number of rows removed from `table` itself.
    fn execute_delete(&mut self, table: &TableSchema, filter: &Filter) -> Result<usize>;

    /// Create `table`, or replace it when its layout changed.
    fn execute_migration(&mut self, table: &TableSchema) -> Result<()>;
}

/// Bind every registered model, apply its tables to `engine`, and mark all
/// persisted models queryable. Returns the applied tables in creation order.
pub fn migrate<E: StorageEngine + ?Sized>(
    registry: &mut ModelRegistry,
    engine: &mut E,
) -> Result<Vec<TableSchema>> {
    let tables = registry.build_all()?;
    for table in &tables {
        engine.execute_migration(table)?;
    }

    let persisted: Vec<String> = registry
        .model_names()
        .filter(|name| {
            registry
                .resolved(name)
                .map(|r| r.is_persisted())
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect();
    for name in &persisted {
        registry.mark_queryable(name)?;
    }

    log::info!(
        "Migrated {} table(s); {} model(s) queryable",
        tables.len(),
        persisted.len()
    );
    Ok(tables)
}
