//! Configuration: schema, loading, validation.
//!
//! The pipeline is load, validate, freeze. Components receive an
//! `Arc<EngineConfig>` and never see configuration change underneath
//! them.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{LoadResult, LoaderOptions, load_config, load_or_builtin};
pub use schema::EngineConfig;
pub use validation::{ValidationResult, validate_config};
