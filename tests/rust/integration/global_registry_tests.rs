//! Process-wide registry access

use ormherit::model_catalog::{
    build_global_schemas, initialize_global_registry, register_global_model,
    with_global_registry, FieldSpec, ModelCatalogError, ModelRegistry, ModelSpec, ModelState,
};
use serial_test::serial;

use super::sample_registry;

#[test]
#[serial]
fn test_initialize_with_loaded_registry() {
    initialize_global_registry(sample_registry());
    let bound = with_global_registry(|r| r.state("ISBN").unwrap());
    assert_eq!(bound, ModelState::SchemaBound);
    assert_eq!(with_global_registry(|r| r.tables().len()), 7);
}

#[test]
#[serial]
fn test_register_and_build_global_models() {
    initialize_global_registry(ModelRegistry::new("shop"));
    register_global_model(
        ModelSpec::new("Product").field(FieldSpec::text("name").max_length(80)),
    )
    .unwrap();
    assert_eq!(
        with_global_registry(|r| r.state("Product").unwrap()),
        ModelState::Declared
    );

    let tables = build_global_schemas().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "shop_product");

    let duplicate = register_global_model(ModelSpec::new("Product"));
    assert!(matches!(
        duplicate,
        Err(ModelCatalogError::DuplicateModel { .. })
    ));
}
