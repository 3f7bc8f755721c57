//! Model declarations.
//!
//! A [`ModelSpec`] is declared once at startup, either from a YAML model file
//! or programmatically through the builder methods below, and is never
//! mutated after registration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::errors::ModelCatalogError;
use super::field_spec::FieldSpec;
use crate::utils::naming::is_valid_identifier;

/// How a model relates to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InheritanceStrategy {
    #[default]
    None,
    AbstractMerge,
    MultiTable,
    Proxy,
}

impl fmt::Display for InheritanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InheritanceStrategy::None => "none",
            InheritanceStrategy::AbstractMerge => "abstract-merge",
            InheritanceStrategy::MultiTable => "multi-table",
            InheritanceStrategy::Proxy => "proxy",
        };
        f.write_str(name)
    }
}

/// One ordering key. Written `created` (ascending) or `-created` (descending).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OrderingTerm {
    pub field: String,
    pub descending: bool,
}

impl OrderingTerm {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn parse(term: &str) -> Self {
        match term.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(term),
        }
    }
}

impl From<String> for OrderingTerm {
    fn from(term: String) -> Self {
        OrderingTerm::parse(&term)
    }
}

impl From<&str> for OrderingTerm {
    fn from(term: &str) -> Self {
        OrderingTerm::parse(term)
    }
}

impl From<OrderingTerm> for String {
    fn from(term: OrderingTerm) -> Self {
        term.to_string()
    }
}

impl fmt::Display for OrderingTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// A computed, non-persisted accessor exposed on a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMethod {
    pub name: String,
    #[serde(flatten)]
    pub kind: DerivedKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedKind {
    /// Current time minus a stored timestamp
    Elapsed { source: String },
    /// Textual rendering of a stored field
    Display { source: String },
}

impl DerivedKind {
    pub fn source(&self) -> &str {
        match self {
            DerivedKind::Elapsed { source } | DerivedKind::Display { source } => source,
        }
    }
}

impl DerivedMethod {
    pub fn elapsed(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DerivedKind::Elapsed {
                source: source.into(),
            },
        }
    }

    pub fn display(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DerivedKind::Display {
                source: source.into(),
            },
        }
    }
}

/// Declared model contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    /// Abstract models are never persisted on their own
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub inheritance: InheritanceStrategy,
    /// Parent model, required by every strategy except `none`
    #[serde(default)]
    pub parent: Option<String>,
    /// Multi-table only: column that is both this model's primary key and
    /// the foreign key to the parent's primary key
    #[serde(default)]
    pub parent_link: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// `None` inherits the parent's ordering; `Some` replaces it
    #[serde(default)]
    pub ordering: Option<Vec<OrderingTerm>>,
    #[serde(default)]
    pub derived: Vec<DerivedMethod>,
    /// Field used when rendering an instance as text
    #[serde(default)]
    pub display_field: Option<String>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            inheritance: InheritanceStrategy::None,
            parent: None,
            parent_link: None,
            fields: Vec::new(),
            ordering: None,
            derived: Vec::new(),
            display_field: None,
        }
    }

    /// Mark as an abstract base
    pub fn abstract_base(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Extend an abstract base; its fields are merged into this model's table
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.inheritance = InheritanceStrategy::AbstractMerge;
        self.parent = Some(base.into());
        self
    }

    /// Extend a concrete model through a one-to-one linked child table
    pub fn multi_table_child(mut self, parent: impl Into<String>, link: impl Into<String>) -> Self {
        self.inheritance = InheritanceStrategy::MultiTable;
        self.parent = Some(parent.into());
        self.parent_link = Some(link.into());
        self
    }

    /// Behavior-only overlay on a concrete model's table
    pub fn proxy_of(mut self, base: impl Into<String>) -> Self {
        self.inheritance = InheritanceStrategy::Proxy;
        self.parent = Some(base.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn ordering<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderingTerm>,
    {
        self.ordering = Some(terms.into_iter().map(Into::into).collect());
        self
    }

    pub fn derived(mut self, method: DerivedMethod) -> Self {
        self.derived.push(method);
        self
    }

    pub fn display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Structural checks that need no other model
    pub fn validate_shape(&self) -> Result<(), ModelCatalogError> {
        if !is_valid_identifier(&self.name) {
            return Err(ModelCatalogError::InvalidIdentifier {
                name: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_valid_identifier(&field.name) {
                return Err(ModelCatalogError::InvalidIdentifier {
                    name: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ModelCatalogError::DuplicateFieldConflict {
                    model: self.name.clone(),
                    field: field.name.clone(),
                    existing: field.field_type,
                    redefined: field.field_type,
                });
            }
        }

        match (self.inheritance, self.parent.as_deref()) {
            (InheritanceStrategy::None, Some(parent)) => {
                return Err(ModelCatalogError::InvalidParent {
                    model: self.name.clone(),
                    reason: format!("parent `{}` given without an inheritance strategy", parent),
                });
            }
            (InheritanceStrategy::None, None) => {}
            (strategy, None) => {
                return Err(ModelCatalogError::InvalidParent {
                    model: self.name.clone(),
                    reason: format!("{} inheritance requires a parent model", strategy),
                });
            }
            (_, Some(_)) => {}
        }

        if self.is_abstract
            && matches!(
                self.inheritance,
                InheritanceStrategy::MultiTable | InheritanceStrategy::Proxy
            )
        {
            return Err(ModelCatalogError::InvalidParent {
                model: self.name.clone(),
                reason: format!("abstract models cannot use {} inheritance", self.inheritance),
            });
        }

        if self.inheritance == InheritanceStrategy::MultiTable {
            match self.parent_link.as_deref() {
                None => {
                    return Err(ModelCatalogError::MissingParentLink {
                        model: self.name.clone(),
                        parent: self.parent.clone().unwrap_or_default(),
                    });
                }
                Some(link) if !is_valid_identifier(link) => {
                    return Err(ModelCatalogError::InvalidIdentifier {
                        name: link.to_string(),
                    });
                }
                Some(_) => {}
            }
        } else if let Some(link) = &self.parent_link {
            return Err(ModelCatalogError::InvalidParent {
                model: self.name.clone(),
                reason: format!(
                    "parent link `{}` is only valid for multi-table inheritance",
                    link
                ),
            });
        }

        Ok(())
    }
}
