//! SQL rendering for derived schemas and query plans.
//!
//! Output targets a generic SQL dialect with double-quoted identifiers:
//! `CREATE TABLE` statements for every [`TableSchema`](crate::model_catalog::TableSchema)
//! and `SELECT ... INNER JOIN ... ORDER BY` statements for every
//! [`QueryPlan`](crate::query_planner::QueryPlan).

mod ddl;
mod errors;
mod select;

pub use ddl::{column_type, create_table_sql, migration_sql};
pub use errors::SqlGenerationError;
pub use select::{select_by_pk_sql, select_sql};

/// Render a schema or plan node as SQL
pub trait ToSql {
    fn to_sql(&self) -> Result<String, SqlGenerationError>;
}
