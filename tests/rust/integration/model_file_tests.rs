//! Schema derivation for every model in the sample file

use ormherit::model_catalog::{ModelState, OrderingTerm};
use ormherit::sql_generator::migration_sql;

use super::sample_registry;

#[test]
fn test_sample_tables_in_creation_order() {
    let registry = sample_registry();
    let tables: Vec<&str> = registry.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        tables,
        vec![
            "orm_itema",
            "orm_itemb",
            "orm_itemc",
            "orm_itemd",
            "orm_books",
            "orm_isbn",
            "orm_bookcontent",
        ]
    );
}

#[test]
fn test_merged_item_tables() {
    let registry = sample_registry();
    let item_a = registry.resolved("ItemA").unwrap().table.clone().unwrap();
    assert_eq!(
        item_a.column_names(),
        vec!["id", "title", "created", "updated", "content"]
    );
    assert_eq!(item_a.column("title").unwrap().origin, "BaseItem");
    assert_eq!(item_a.column("content").unwrap().origin, "ItemA");

    let item_c = registry.resolved("ItemC").unwrap().table.clone().unwrap();
    assert_eq!(
        item_c.column("file").unwrap().upload_to.as_deref(),
        Some("images")
    );
    let item_d = registry.resolved("ItemD").unwrap().table.clone().unwrap();
    assert!(item_d.column("slug").unwrap().constraints.unique);
}

#[test]
fn test_item_ordering_inherited_or_overridden() {
    let registry = sample_registry();
    assert_eq!(
        registry.resolved("ItemA").unwrap().ordering,
        vec![OrderingTerm::desc("created")]
    );
    assert_eq!(
        registry.resolved("ItemB").unwrap().ordering,
        vec![OrderingTerm::asc("title")]
    );
}

#[test]
fn test_build_schema_per_strategy() {
    let mut registry = sample_registry();
    assert!(registry.build_schema("BaseItem").unwrap().is_empty());
    assert!(registry.build_schema("BookOrders").unwrap().is_empty());
    assert_eq!(registry.build_schema("ItemD").unwrap().len(), 1);

    let isbn = registry.build_schema("ISBN").unwrap();
    assert_eq!(isbn.len(), 1);
    assert_eq!(isbn[0].primary_key, "books_ptr");
    assert_eq!(isbn[0].column_names(), vec!["books_ptr", "ISBN"]);
    let fk = &isbn[0].foreign_keys[0];
    assert_eq!(
        (fk.references_table.as_str(), fk.references_column.as_str()),
        ("orm_books", "id")
    );
}

#[test]
fn test_loaded_models_are_schema_bound() {
    let registry = sample_registry();
    assert_eq!(registry.state("ItemA").unwrap(), ModelState::SchemaBound);
    assert_eq!(registry.state("BaseItem").unwrap(), ModelState::SchemaBound);
}

#[test]
fn test_proxy_plan_reads_base_table_with_own_ordering() {
    let registry = sample_registry();
    let plan = registry.resolve_query_plan("BookOrders", None).unwrap();
    assert_eq!(plan.table_names(), vec!["orm_bookcontent"]);
    assert!(plan.joins.is_empty());
    assert_eq!(plan.ordering_terms(), vec![OrderingTerm::asc("created")]);
    assert_eq!(plan.derived[0].name, "created_on");
}

#[test]
fn test_migration_sql_for_sample() {
    let registry = sample_registry();
    let sql = migration_sql(registry.tables(), true).unwrap();
    assert_eq!(sql.matches("CREATE TABLE IF NOT EXISTS").count(), 7);
    assert!(sql.contains("\"slug\" VARCHAR(255) NOT NULL UNIQUE"));
    assert!(sql.contains(
        "\"books_ptr\" INTEGER NOT NULL PRIMARY KEY REFERENCES \"orm_books\" (\"id\") ON DELETE CASCADE"
    ));
    assert!(!sql.contains("orm_baseitem"));
    assert!(!sql.contains("orm_bookorders"));
}
