//! Unit tests - strategy properties and error cases through the public API
//!
//! No storage engine involved; every test works on a fresh registry.

mod model_file_errors;
mod strategy_properties;
