use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGenerationError {
    #[error("Query plan for `{0}` has no tables (abstract models cannot be queried)")]
    NoTables(String),
    #[error("Table `{0}` has no columns")]
    EmptyTable(String),
    #[error("Primary key `{column}` is not a column of table `{table}`")]
    MissingPrimaryKey { table: String, column: String },
    #[error("Column `{column}` not found in table `{table}`")]
    ColumnNotFound { table: String, column: String },
}
