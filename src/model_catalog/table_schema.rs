use serde::{Deserialize, Serialize};

use super::field_spec::{DefaultRule, FieldConstraints, FieldSpec, FieldType};
use crate::utils::naming::IMPLICIT_PK;

/// A physical column derived from a [`FieldSpec`] or generated by a mapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub field_type: FieldType,
    pub constraints: FieldConstraints,
    pub default: DefaultRule,
    pub upload_to: Option<String>,
    pub primary_key: bool,
    /// Model that declared the field (the abstract base for merged fields)
    pub origin: String,
}

impl ColumnSpec {
    pub fn from_field(field: &FieldSpec, origin: impl Into<String>) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type,
            constraints: field.constraints.clone(),
            default: field.default,
            upload_to: field.upload_to.clone(),
            primary_key: false,
            origin: origin.into(),
        }
    }

    /// Auto-assigned integer primary key
    pub fn implicit_pk(origin: impl Into<String>) -> Self {
        Self {
            name: IMPLICIT_PK.to_string(),
            field_type: FieldType::Integer,
            constraints: FieldConstraints {
                required: false,
                unique: true,
                max_length: None,
            },
            default: DefaultRule::None,
            upload_to: None,
            primary_key: true,
            origin: origin.into(),
        }
    }

    /// Primary key column that also references the parent's primary key
    pub fn parent_link(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Integer,
            constraints: FieldConstraints {
                required: true,
                unique: true,
                max_length: None,
            },
            default: DefaultRule::None,
            upload_to: None,
            primary_key: true,
            origin: origin.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Deleting the referenced row deletes the referencing row
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub on_delete: OnDelete,
    pub one_to_one: bool,
}

/// Derived physical storage layout of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Model whose rows own this table
    pub model: String,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: String,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Primary key is assigned by the storage engine rather than the caller
    pub fn has_auto_pk(&self) -> bool {
        self.primary_key == IMPLICIT_PK && self.foreign_keys.iter().all(|fk| fk.column != IMPLICIT_PK)
    }

    /// Foreign keys of this table pointing at `table`
    pub fn references_to<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.references_table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books_and_isbn() -> (TableSchema, TableSchema) {
        let books = TableSchema {
            name: "orm_books".to_string(),
            model: "Books".to_string(),
            columns: vec![
                ColumnSpec::implicit_pk("Books"),
                ColumnSpec::from_field(&FieldSpec::text("title").max_length(100), "Books"),
            ],
            primary_key: "id".to_string(),
            foreign_keys: vec![],
        };
        let isbn = TableSchema {
            name: "orm_isbn".to_string(),
            model: "ISBN".to_string(),
            columns: vec![
                ColumnSpec::parent_link("books_ptr", "ISBN"),
                ColumnSpec::from_field(&FieldSpec::text("ISBN"), "ISBN"),
            ],
            primary_key: "books_ptr".to_string(),
            foreign_keys: vec![ForeignKey {
                column: "books_ptr".to_string(),
                references_table: "orm_books".to_string(),
                references_column: "id".to_string(),
                on_delete: OnDelete::Cascade,
                one_to_one: true,
            }],
        };
        (books, isbn)
    }

    #[test]
    fn test_auto_pk_detection() {
        let (books, isbn) = books_and_isbn();
        assert!(books.has_auto_pk());
        assert!(!isbn.has_auto_pk());
    }

    #[test]
    fn test_references_to() {
        let (books, isbn) = books_and_isbn();
        assert_eq!(isbn.references_to(&books.name).count(), 1);
        assert_eq!(books.references_to(&isbn.name).count(), 0);
        assert_eq!(isbn.column_names(), vec!["books_ptr", "ISBN"]);
    }
}
