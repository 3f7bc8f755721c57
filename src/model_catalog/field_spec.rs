//! Field declarations.
//!
//! A [`FieldSpec`] is the declared contract of one persisted attribute: its
//! primitive type, its constraints, and the rule (if any) that generates its
//! value on the write path.
//!
//! ```yaml
//! - { name: title, type: text, max_length: 255 }
//! - { name: created, type: timestamp, default: now_on_create }
//! - { name: file, type: blob_reference, upload_to: files }
//! - { name: slug, type: slug, max_length: 255, unique: true }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    /// Text restricted to letters, digits, hyphens and underscores
    Slug,
    Integer,
    Timestamp,
    /// Path of an uploaded file, stored relative to `upload_to`
    BlobReference,
}

impl FieldType {
    /// Whether values of this type are stored as text
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::Slug | FieldType::BlobReference
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Slug => "slug",
            FieldType::Integer => "integer",
            FieldType::Timestamp => "timestamp",
            FieldType::BlobReference => "blob_reference",
        };
        f.write_str(name)
    }
}

/// Value-generation rule applied by the write path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultRule {
    #[default]
    None,
    /// Set to the current time when the row is created
    NowOnCreate,
    /// Set to the current time on creation and on every update
    NowOnUpdate,
}

impl DefaultRule {
    pub fn is_generated(&self) -> bool {
        !matches!(self, DefaultRule::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraints {
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
}

fn default_required() -> bool {
    true
}

impl Default for FieldConstraints {
    fn default() -> Self {
        Self {
            required: true,
            unique: false,
            max_length: None,
        }
    }
}

/// A declared model field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(flatten)]
    pub constraints: FieldConstraints,
    #[serde(default)]
    pub default: DefaultRule,
    /// Only meaningful for blob references: directory prefix of stored paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_to: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            constraints: FieldConstraints::default(),
            default: DefaultRule::None,
            upload_to: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn slug(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Slug)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub fn blob(name: impl Into<String>, upload_to: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::BlobReference);
        field.upload_to = Some(upload_to.into());
        field
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.constraints.max_length = Some(max_length);
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.constraints.required = false;
        self
    }

    pub fn with_default(mut self, rule: DefaultRule) -> Self {
        self.default = rule;
        self
    }

    /// `auto_now_add` style creation timestamp
    pub fn created_at(name: impl Into<String>) -> Self {
        Self::timestamp(name).with_default(DefaultRule::NowOnCreate)
    }

    /// `auto_now` style modification timestamp
    pub fn updated_at(name: impl Into<String>) -> Self {
        Self::timestamp(name).with_default(DefaultRule::NowOnUpdate)
    }

    /// Whether callers must supply a value on create
    pub fn requires_input(&self) -> bool {
        self.constraints.required && !self.default.is_generated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_spec_yaml_defaults() {
        let yaml = "{ name: title, type: text, max_length: 255 }";
        let field: FieldSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(field.name, "title");
        assert_eq!(field.field_type, FieldType::Text);
        assert!(field.constraints.required);
        assert!(!field.constraints.unique);
        assert_eq!(field.constraints.max_length, Some(255));
        assert_eq!(field.default, DefaultRule::None);
    }

    #[test]
    fn test_field_spec_yaml_blob_and_default_rule() {
        let yaml = r#"
- { name: file, type: blob_reference, upload_to: images }
- { name: updated, type: timestamp, default: now_on_update }
"#;
        let fields: Vec<FieldSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fields[0].upload_to.as_deref(), Some("images"));
        assert_eq!(fields[1].default, DefaultRule::NowOnUpdate);
        assert!(!fields[1].requires_input());
    }

    #[test]
    fn test_builders() {
        let slug = FieldSpec::slug("slug").max_length(255).unique();
        assert_eq!(slug.field_type, FieldType::Slug);
        assert!(slug.constraints.unique);
        assert!(slug.field_type.is_textual());
        assert!(!FieldSpec::integer("pages").optional().constraints.required);
    }
}
