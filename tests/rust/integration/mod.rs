//! Integration tests - end-to-end scenarios over the sample model file
//!
//! These tests load `schemas/inheritance.yaml`, migrate it into the in-memory
//! engine, and drive reads and writes through a session.

mod global_registry_tests;
mod model_file_tests;
mod session_scenarios;

use ormherit::model_catalog::{ModelFileConfig, ModelRegistry};
use ormherit::storage::{migrate, MemoryEngine};

pub const SAMPLE_MODELS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/schemas/inheritance.yaml");

/// Registry for the sample model file, bound but not migrated
pub fn sample_registry() -> ModelRegistry {
    ModelFileConfig::from_yaml_file(SAMPLE_MODELS)
        .and_then(|file| file.to_registry("orm"))
        .expect("sample model file should load")
}

/// Sample registry migrated into a fresh in-memory engine
pub fn migrated_sample() -> (ModelRegistry, MemoryEngine) {
    let mut registry = sample_registry();
    let mut engine = MemoryEngine::new();
    migrate(&mut registry, &mut engine).expect("sample models should migrate");
    (registry, engine)
}
