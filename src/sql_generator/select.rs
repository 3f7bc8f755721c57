use crate::query_planner::types::{JoinSpec, OrderByItem, QueryPlan};
use crate::utils::naming::quote_ident;

use super::errors::SqlGenerationError;
use super::ToSql;

fn qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(column))
}

impl ToSql for JoinSpec {
    fn to_sql(&self) -> Result<String, SqlGenerationError> {
        Ok(format!(
            "INNER JOIN {} ON {} = {}",
            quote_ident(&self.right_table),
            qualified(&self.left_table, &self.left_column),
            qualified(&self.right_table, &self.right_column)
        ))
    }
}

impl ToSql for OrderByItem {
    fn to_sql(&self) -> Result<String, SqlGenerationError> {
        Ok(format!(
            "{} {}",
            qualified(&self.table, &self.column),
            if self.descending { "DESC" } else { "ASC" }
        ))
    }
}

impl ToSql for QueryPlan {
    fn to_sql(&self) -> Result<String, SqlGenerationError> {
        select_sql(self)
    }
}

fn select_body(plan: &QueryPlan) -> Result<String, SqlGenerationError> {
    let base = plan
        .tables
        .first()
        .ok_or_else(|| SqlGenerationError::NoTables(plan.model.clone()))?;

    let columns: Vec<String> = plan
        .tables
        .iter()
        .flat_map(|t| t.columns.iter().map(move |c| qualified(&t.name, &c.name)))
        .collect();

    let mut sql = format!(
        "SELECT {}\nFROM {}",
        columns.join(", "),
        quote_ident(&base.name)
    );
    for join in &plan.joins {
        sql.push('\n');
        sql.push_str(&join.to_sql()?);
    }
    Ok(sql)
}

fn order_by_clause(plan: &QueryPlan) -> Result<String, SqlGenerationError> {
    if plan.order_by.is_empty() {
        return Ok(String::new());
    }
    let items = plan
        .order_by
        .iter()
        .map(|item| {
            let known = plan
                .tables
                .iter()
                .any(|t| t.name == item.table && t.has_column(&item.column));
            if !known {
                return Err(SqlGenerationError::ColumnNotFound {
                    table: item.table.clone(),
                    column: item.column.clone(),
                });
            }
            item.to_sql()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("\nORDER BY {}", items.join(", ")))
}

/// `SELECT` reading every instance of the planned model
pub fn select_sql(plan: &QueryPlan) -> Result<String, SqlGenerationError> {
    Ok(format!("{}{};", select_body(plan)?, order_by_clause(plan)?))
}

/// `SELECT` reading one instance by primary key, with a `?` placeholder
pub fn select_by_pk_sql(plan: &QueryPlan) -> Result<String, SqlGenerationError> {
    let body = select_body(plan)?;
    let base = plan
        .base_table()
        .ok_or_else(|| SqlGenerationError::NoTables(plan.model.clone()))?;
    Ok(format!(
        "{}\nWHERE {} = ?;",
        body,
        qualified(&base.name, &base.primary_key)
    ))
}
