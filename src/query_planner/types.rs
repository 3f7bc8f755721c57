use serde::Serialize;

use crate::model_catalog::model_spec::{DerivedMethod, OrderingTerm};
use crate::model_catalog::table_schema::TableSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
}

/// Equality join between a table already in the plan and the next ancestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

/// Ordering key resolved to the table that stores the column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderByItem {
    pub table: String,
    pub column: String,
    pub descending: bool,
}

impl OrderByItem {
    pub fn term(&self) -> OrderingTerm {
        OrderingTerm {
            field: self.column.clone(),
            descending: self.descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub model: String,
    /// The model's own storage table first, then each ancestor table
    pub tables: Vec<TableSchema>,
    pub joins: Vec<JoinSpec>,
    pub order_by: Vec<OrderByItem>,
    /// Non-persisted accessors available on returned rows
    pub derived: Vec<DerivedMethod>,
}

impl QueryPlan {
    /// Table named in the FROM clause
    pub fn base_table(&self) -> Option<&TableSchema> {
        self.tables.first()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn ordering_terms(&self) -> Vec<OrderingTerm> {
        self.order_by.iter().map(OrderByItem::term).collect()
    }
}
