//! ormherit - model inheritance mapping for relational storage
//!
//! This crate maps model class hierarchies onto tables through three
//! inheritance strategies:
//! - Abstract-base merge: base fields copied into every concrete subclass table
//! - Multi-table: one table per level, linked by a cascading one-to-one key
//! - Proxy: the base table reused with different ordering and derived methods
//!
//! Models are registered in a [`model_catalog::ModelRegistry`], bound to
//! table schemas by the [`schema_mapper`] strategies, planned by the
//! [`query_planner`], rendered by the [`sql_generator`], and read and written
//! through a [`session::Session`] over any [`storage::StorageEngine`].

pub mod utils;

pub mod config;
pub mod model_catalog;
pub mod query_planner;
pub mod schema_mapper;
pub mod session;
pub mod sql_generator;
pub mod storage;
