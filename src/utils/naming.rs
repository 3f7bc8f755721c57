//! Centralized naming utilities for models, fields and physical tables.
//!
//! All table-name and column-name generation goes through these functions so
//! the schema mapper, the SQL generator and the storage engines agree on the
//! same physical names.
//!
//! ## Naming Convention
//! - Table: `{app_label}_{model_name_lowercased}`
//! - Implicit primary key: `id`
//!
//! Examples:
//! - `("orm", "ItemA")` → `"orm_itema"`
//! - `("shop", "BookOrders")` → `"shop_bookorders"`

use lazy_static::lazy_static;
use regex::Regex;

/// Name of the implicit auto-increment primary key column.
pub const IMPLICIT_PK: &str = "id";

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref SLUG: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
}

/// Check that a model, field or app label name is a plain identifier.
///
/// # Examples
/// ```
/// use ormherit::utils::naming::is_valid_identifier;
///
/// assert!(is_valid_identifier("books_ptr"));
/// assert!(is_valid_identifier("ISBN"));
/// assert!(!is_valid_identifier("2fast"));
/// assert!(!is_valid_identifier("drop table"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check that a value is a URL slug (letters, digits, hyphens, underscores).
pub fn is_valid_slug(value: &str) -> bool {
    SLUG.is_match(value)
}

/// Generate the physical table name for a model.
///
/// # Examples
/// ```
/// use ormherit::utils::naming::table_name;
///
/// assert_eq!(table_name("orm", "ItemA"), "orm_itema");
/// assert_eq!(table_name("orm", "BookContent"), "orm_bookcontent");
/// ```
pub fn table_name(app_label: &str, model: &str) -> String {
    format!("{}_{}", app_label, model.to_lowercase())
}

/// Quote an identifier for SQL output, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
