//! Configuration loading.
//!
//! Load, validate, freeze: a YAML file is parsed into [`EngineConfig`],
//! run through the validator, and handed back behind an `Arc` so every
//! component shares one immutable view. With no file, the built-in
//! configuration goes through the same pipeline.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::schema::{EngineConfig, EngineLimits};
use crate::config::validation::validate_config;
use crate::error::{ConfigError, Result, ValidationIssue};

/// Environment variable overriding the config file size limit.
pub const MAX_CONFIG_BYTES_ENV: &str = "PROGRESSION_MAX_CONFIG_BYTES";

/// Options controlling how configuration is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    /// Treat validation warnings as errors
    pub strict: bool,
}

/// A loaded, validated, frozen configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The frozen configuration
    pub config: Arc<EngineConfig>,
    /// Validation warnings that did not block loading
    pub warnings: Vec<ValidationIssue>,
}

fn max_config_bytes() -> u64 {
    std::env::var(MAX_CONFIG_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(EngineLimits::default().max_config_bytes)
}

/// Loads a configuration file.
///
/// # Errors
///
/// Fails on missing or oversized files, YAML that does not parse, and
/// validation errors (or warnings, under `strict`).
pub fn load_config(path: &Path, options: LoaderOptions) -> Result<LoadResult> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::MissingFile { path: display }.into());
    }

    let size = std::fs::metadata(path)?.len();
    let limit = max_config_bytes();
    if size > limit {
        return Err(ConfigError::TooLarge {
            path: display,
            size,
            limit,
        }
        .into());
    }

    let raw = std::fs::read_to_string(path)?;
    let config: EngineConfig =
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: display.clone(),
            message: e.to_string(),
        })?;

    finish(config, &display, options)
}

/// Loads from a file when given, otherwise freezes the built-in
/// configuration through the same validation path.
///
/// # Errors
///
/// Same failure modes as [`load_config`].
pub fn load_or_builtin(path: Option<&Path>, options: LoaderOptions) -> Result<LoadResult> {
    match path {
        Some(path) => load_config(path, options),
        None => finish(EngineConfig::builtin(), "<builtin>", options),
    }
}

fn finish(config: EngineConfig, source: &str, options: LoaderOptions) -> Result<LoadResult> {
    let result = validate_config(&config);
    if !result.is_ok() || (options.strict && !result.warnings.is_empty()) {
        let mut errors = result.errors;
        if options.strict {
            errors.extend(result.warnings);
        }
        return Err(ConfigError::ValidationError {
            path: source.to_string(),
            errors,
        }
        .into());
    }
    for warning in &result.warnings {
        warn!(%warning, source, "config warning");
    }
    info!(
        source,
        triggers = config.triggers.len(),
        behaviors = config.behaviors.len(),
        "configuration loaded"
    );
    Ok(LoadResult {
        config: Arc::new(config),
        warnings: result.warnings,
    })
}

// ============================================================================
// Tests
// ============================================================================
