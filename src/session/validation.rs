//! Field-level validation applied by the session before rows reach storage.

use crate::model_catalog::field_spec::{FieldSpec, FieldType};
use crate::storage::{Result, Row, StorageError, Value};
use crate::utils::naming::is_valid_slug;

/// Check one value against its field and return the value to store.
///
/// Blob references are normalised to live under the field's `upload_to`
/// prefix.
pub fn validate_value(field: &FieldSpec, value: Value) -> Result<Value> {
    if value.is_null() {
        if field.constraints.required {
            return Err(StorageError::validation(&field.name, "this field is required"));
        }
        return Ok(value);
    }
    if !value.fits(field.field_type) {
        return Err(StorageError::validation(
            &field.name,
            format!("expected {}, got {}", field.field_type, value.type_name()),
        ));
    }

    let text = match value {
        Value::Text(text) => text,
        other => return Ok(other),
    };

    if let Some(max) = field.constraints.max_length {
        let len = text.chars().count();
        if len > max {
            return Err(StorageError::validation(
                &field.name,
                format!("at most {} characters allowed, got {}", max, len),
            ));
        }
    }

    match field.field_type {
        FieldType::Slug if !is_valid_slug(&text) => Err(StorageError::validation(
            &field.name,
            "slugs may only contain letters, digits, hyphens and underscores",
        )),
        FieldType::BlobReference => Ok(Value::Text(with_upload_prefix(
            field.upload_to.as_deref(),
            text,
        ))),
        _ => Ok(Value::Text(text)),
    }
}

fn with_upload_prefix(upload_to: Option<&str>, path: String) -> String {
    match upload_to.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() && !path.starts_with(&format!("{}/", prefix)) => {
            format!("{}/{}", prefix, path.trim_start_matches('/'))
        }
        _ => path,
    }
}

/// Validate every field of an insert. Fields absent from `row` must not
/// require input.
pub fn validate_insert(fields: &[FieldSpec], row: Row) -> Result<Row> {
    let mut row = row;
    let mut validated = Row::new();
    for field in fields {
        match row.remove(&field.name) {
            Some(value) => {
                validated.insert(field.name.clone(), validate_value(field, value)?);
            }
            None if field.requires_input() => {
                return Err(StorageError::validation(&field.name, "this field is required"));
            }
            None => {}
        }
    }
    match row.keys().next() {
        Some(unknown) => Err(StorageError::validation(unknown.as_str(), "unknown field")),
        None => Ok(validated),
    }
}

/// Validate only the fields present in `row`
pub fn validate_partial(fields: &[FieldSpec], row: Row) -> Result<Row> {
    row.into_iter()
        .map(|(name, value)| {
            let field = fields
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| StorageError::validation(name.as_str(), "unknown field"))?;
            Ok((name, validate_value(field, value)?))
        })
        .collect()
}
