use ormherit::model_catalog::{ModelCatalogError, ModelFileConfig};
use test_case::test_case;

fn load(yaml: &str) -> Result<(), ModelCatalogError> {
    ModelFileConfig::from_yaml_str(yaml)?.to_registry("orm")?;
    Ok(())
}

const MISSING_LINK: &str = r#"
models:
  - name: Books
    fields: [{ name: title, type: text }]
  - name: ISBN
    inheritance: multi-table
    parent: Books
"#;

const PROXY_FIELD: &str = r#"
models:
  - name: BookContent
    fields: [{ name: title, type: text }]
  - name: BookOrders
    inheritance: proxy
    parent: BookContent
    fields: [{ name: note, type: text }]
"#;

const MERGE_FROM_CONCRETE: &str = r#"
models:
  - name: Books
    fields: [{ name: title, type: text }]
  - name: Item
    inheritance: abstract-merge
    parent: Books
"#;

const BAD_ORDERING: &str = r#"
models:
  - name: Books
    ordering: [-published]
    fields: [{ name: title, type: text }]
"#;

const BAD_IDENTIFIER: &str = r#"
models:
  - name: Books
    fields: [{ name: "first title", type: text }]
"#;

const ELAPSED_ON_TEXT: &str = r#"
models:
  - name: Books
    fields: [{ name: title, type: text }]
    derived:
      - { name: age, kind: elapsed, source: title }
"#;

#[test_case(MISSING_LINK ; "multi-table without parent link")]
fn test_missing_parent_link(yaml: &str) {
    assert!(matches!(load(yaml), Err(ModelCatalogError::MissingParentLink { .. })));
}

#[test_case(PROXY_FIELD, "InvalidProxyMutation" ; "proxy declaring a field")]
#[test_case(MERGE_FROM_CONCRETE, "InvalidParent" ; "merge from concrete model")]
#[test_case(BAD_ORDERING, "UnknownOrderingField" ; "ordering on unknown field")]
#[test_case(BAD_IDENTIFIER, "InvalidIdentifier" ; "field name with space")]
#[test_case(ELAPSED_ON_TEXT, "InvalidDerivedMethod" ; "elapsed over text field")]
fn test_model_file_rejected(yaml: &str, kind: &str) {
    let err = load(yaml).unwrap_err();
    assert!(format!("{:?}", err).starts_with(kind), "got {:?}", err);
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_unknown_strategy_is_parse_error() {
    let yaml = "models:\n  - name: Books\n    inheritance: single-table\n";
    assert!(matches!(
        ModelFileConfig::from_yaml_str(yaml),
        Err(ModelCatalogError::ConfigParseError { .. })
    ));
}
