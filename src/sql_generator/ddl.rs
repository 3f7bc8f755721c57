use crate::model_catalog::field_spec::FieldType;
use crate::model_catalog::table_schema::{ColumnSpec, OnDelete, TableSchema};
use crate::utils::naming::quote_ident;

use super::errors::SqlGenerationError;
use super::ToSql;

const DEFAULT_SLUG_LENGTH: usize = 50;
const DEFAULT_BLOB_PATH_LENGTH: usize = 100;

/// SQL type of a column
pub fn column_type(column: &ColumnSpec) -> String {
    let max = column.constraints.max_length;
    match column.field_type {
        FieldType::Text => match max {
            Some(n) => format!("VARCHAR({})", n),
            None => "TEXT".to_string(),
        },
        FieldType::Slug => format!("VARCHAR({})", max.unwrap_or(DEFAULT_SLUG_LENGTH)),
        FieldType::BlobReference => {
            format!("VARCHAR({})", max.unwrap_or(DEFAULT_BLOB_PATH_LENGTH))
        }
        FieldType::Integer => "INTEGER".to_string(),
        FieldType::Timestamp => "TIMESTAMP".to_string(),
    }
}

struct ColumnDef<'a> {
    table: &'a TableSchema,
    column: &'a ColumnSpec,
}

impl ToSql for ColumnDef<'_> {
    fn to_sql(&self) -> Result<String, SqlGenerationError> {
        let ColumnDef { table, column } = self;
        let mut sql = format!("{} {}", quote_ident(&column.name), column_type(column));

        if column.primary_key {
            sql.push_str(" NOT NULL PRIMARY KEY");
            if table.has_auto_pk() {
                sql.push_str(" AUTOINCREMENT");
            }
        } else {
            if column.constraints.required {
                sql.push_str(" NOT NULL");
            }
            if column.constraints.unique {
                sql.push_str(" UNIQUE");
            }
        }

        for fk in table.foreign_keys.iter().filter(|fk| fk.column == column.name) {
            sql.push_str(&format!(
                " REFERENCES {} ({})",
                quote_ident(&fk.references_table),
                quote_ident(&fk.references_column)
            ));
            match fk.on_delete {
                OnDelete::Cascade => sql.push_str(" ON DELETE CASCADE"),
            }
        }
        Ok(sql)
    }
}

impl ToSql for TableSchema {
    fn to_sql(&self) -> Result<String, SqlGenerationError> {
        create_table_sql(self, false)
    }
}

/// `CREATE TABLE` statement for one table
pub fn create_table_sql(table: &TableSchema, if_not_exists: bool) -> Result<String, SqlGenerationError> {
    if table.columns.is_empty() {
        return Err(SqlGenerationError::EmptyTable(table.name.clone()));
    }
    if !table.has_column(&table.primary_key) {
        return Err(SqlGenerationError::MissingPrimaryKey {
            table: table.name.clone(),
            column: table.primary_key.clone(),
        });
    }

    let columns = table
        .columns
        .iter()
        .map(|column| ColumnDef { table, column }.to_sql())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!(
        "CREATE TABLE {}{} (\n    {}\n);",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(&table.name),
        columns.join(",\n    ")
    ))
}

/// DDL for a set of tables, in the given order, separated by blank lines
pub fn migration_sql<'a, I>(tables: I, if_not_exists: bool) -> Result<String, SqlGenerationError>
where
    I: IntoIterator<Item = &'a TableSchema>,
{
    let statements = tables
        .into_iter()
        .map(|t| create_table_sql(t, if_not_exists))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(statements.join("\n\n"))
}
