use std::collections::BTreeSet;

use ormherit::model_catalog::{
    FieldSpec, FieldType, ModelCatalogError, ModelRegistry, ModelSpec, OnDelete, OrderingTerm,
};
use test_case::test_case;

fn base_item() -> ModelSpec {
    ModelSpec::new("BaseItem")
        .abstract_base()
        .ordering(["title"])
        .field(FieldSpec::text("title").max_length(255))
        .field(FieldSpec::created_at("created"))
        .field(FieldSpec::updated_at("updated"))
}

#[test_case(vec![FieldSpec::text("content")] ; "text subclass")]
#[test_case(vec![FieldSpec::blob("file", "files")] ; "blob subclass")]
#[test_case(vec![FieldSpec::slug("slug").unique(), FieldSpec::integer("rank")] ; "two fields")]
#[test_case(vec![FieldSpec::text("title").max_length(80)] ; "redeclared base field")]
#[test_case(vec![] ; "no own fields")]
fn test_abstract_subclass_columns_are_field_union(own: Vec<FieldSpec>) {
    let mut registry = ModelRegistry::new("orm");
    registry.register_model(base_item()).unwrap();
    let mut child = ModelSpec::new("Item").extends("BaseItem");
    for field in &own {
        child = child.field(field.clone());
    }
    registry.register_model(child).unwrap();

    let tables = registry.build_schema("Item").unwrap();
    assert_eq!(tables.len(), 1);

    let columns: BTreeSet<&str> = tables[0].column_names().into_iter().collect();
    let mut expected: BTreeSet<&str> = ["id", "title", "created", "updated"].into();
    expected.extend(own.iter().map(|f| f.name.as_str()));
    assert_eq!(columns, expected);
    assert_eq!(tables[0].columns.len(), expected.len());
    assert!(registry.build_schema("BaseItem").unwrap().is_empty());
}

#[test_case(FieldType::Integer ; "integer")]
#[test_case(FieldType::Timestamp ; "timestamp")]
#[test_case(FieldType::Slug ; "slug")]
fn test_incompatible_redeclaration_conflicts(field_type: FieldType) {
    let mut registry = ModelRegistry::new("orm");
    registry.register_model(base_item()).unwrap();
    registry
        .register_model(
            ModelSpec::new("Item")
                .extends("BaseItem")
                .field(FieldSpec::new("title", field_type)),
        )
        .unwrap();
    assert_eq!(
        registry.build_schema("Item").unwrap_err(),
        ModelCatalogError::DuplicateFieldConflict {
            model: "Item".to_string(),
            field: "title".to_string(),
            existing: FieldType::Text,
            redefined: field_type,
        }
    );
}

#[test_case(2 ; "parent and child")]
#[test_case(3 ; "three levels")]
#[test_case(4 ; "four levels")]
fn test_multi_table_chain_links_every_level(depth: usize) {
    let mut registry = ModelRegistry::new("orm");
    registry
        .register_model(ModelSpec::new("Level0").field(FieldSpec::text("f0")))
        .unwrap();
    for level in 1..depth {
        registry
            .register_model(
                ModelSpec::new(format!("Level{}", level))
                    .multi_table_child(format!("Level{}", level - 1), format!("level{}_ptr", level - 1))
                    .field(FieldSpec::text(format!("f{}", level))),
            )
            .unwrap();
    }
    let all = registry.build_all().unwrap();
    assert_eq!(all.len(), depth);

    for child in all.iter().skip(1) {
        assert_eq!(child.foreign_keys.len(), 1);
        let fk = &child.foreign_keys[0];
        assert_eq!(fk.column, child.primary_key);
        assert_eq!(fk.on_delete, OnDelete::Cascade);
        assert!(fk.one_to_one);
    }

    let leaf = format!("Level{}", depth - 1);
    let plan = registry.resolve_query_plan(&leaf, None).unwrap();
    assert_eq!(plan.tables.len(), depth);
    assert_eq!(plan.joins.len(), depth - 1);
    let fields: Vec<&str> = registry
        .resolved(&leaf)
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    let expected: Vec<String> = (0..depth).map(|i| format!("f{}", i)).collect();
    assert_eq!(fields, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test_case(None, vec![OrderingTerm::asc("created")] ; "proxy default")]
#[test_case(Some(vec![OrderingTerm::desc("title")]), vec![OrderingTerm::desc("title")] ; "explicit override")]
fn test_proxy_plan_uses_base_table(
    explicit: Option<Vec<OrderingTerm>>,
    expected: Vec<OrderingTerm>,
) {
    let mut registry = ModelRegistry::new("orm");
    registry
        .register_model(
            ModelSpec::new("BookContent")
                .ordering(["-title"])
                .field(FieldSpec::text("title").max_length(100))
                .field(FieldSpec::created_at("created")),
        )
        .unwrap();
    registry
        .register_model(ModelSpec::new("BookOrders").proxy_of("BookContent").ordering(["created"]))
        .unwrap();
    assert!(registry.build_schema("BookOrders").unwrap().is_empty());

    let plan = registry
        .resolve_query_plan("BookOrders", explicit.as_deref())
        .unwrap();
    assert_eq!(plan.table_names(), vec!["orm_bookcontent"]);
    assert_eq!(plan.ordering_terms(), expected);
}

#[test]
fn test_proxy_with_field_rejected() {
    let mut registry = ModelRegistry::new("orm");
    registry
        .register_model(ModelSpec::new("BookContent").field(FieldSpec::text("title")))
        .unwrap();
    registry
        .register_model(
            ModelSpec::new("BookOrders")
                .proxy_of("BookContent")
                .field(FieldSpec::text("note")),
        )
        .unwrap();
    assert_eq!(
        registry.build_schema("BookOrders").unwrap_err(),
        ModelCatalogError::InvalidProxyMutation {
            model: "BookOrders".to_string(),
            field: "note".to_string(),
        }
    );
}

#[test]
fn test_unregistered_parent_and_model() {
    let mut registry = ModelRegistry::new("orm");
    assert!(matches!(
        registry.register_model(ModelSpec::new("ISBN").multi_table_child("Books", "books_ptr")),
        Err(ModelCatalogError::UnregisteredModel { .. })
    ));
    assert!(matches!(
        registry.build_schema("Nothing"),
        Err(ModelCatalogError::UnregisteredModel { .. })
    ));
}
