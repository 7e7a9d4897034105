// src/config/loader.rs

use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply environment
/// overrides or validate. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, apply environment overrides and validate.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let mut raw = load_from_path(&path)?;
    apply_overrides(&mut raw, |key| std::env::var(key).ok())?;
    ConfigFile::try_from(raw)
}

/// Like [`load_and_validate`], but a missing path means "defaults plus
/// environment".
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let mut raw = RawConfigFile::default();
            apply_overrides(&mut raw, |key| std::env::var(key).ok())?;
            ConfigFile::try_from(raw)
        }
    }
}

/// Apply environment overrides found through `lookup`.
///
/// Recognised keys: `TIME_ADDITION_MS`, `TIME_SUBTRACTION_MS`,
/// `TIME_MULTIPLICATIONS_MS`, `TIME_DIVISIONS_MS`, `COMPUTING_POWER` and
/// `MAX_RETRIES`.
///
/// `lookup` is injected so callers (and tests) are not tied to the process
/// environment.
pub fn apply_overrides<F>(raw: &mut RawConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_override(&lookup, "TIME_ADDITION_MS")? {
        raw.timing.addition_ms = v;
    }
    if let Some(v) = parse_override(&lookup, "TIME_SUBTRACTION_MS")? {
        raw.timing.subtraction_ms = v;
    }
    if let Some(v) = parse_override(&lookup, "TIME_MULTIPLICATIONS_MS")? {
        raw.timing.multiplication_ms = v;
    }
    if let Some(v) = parse_override(&lookup, "TIME_DIVISIONS_MS")? {
        raw.timing.division_ms = v;
    }
    if let Some(v) = parse_override(&lookup, "COMPUTING_POWER")? {
        raw.worker.computing_power = v;
    }
    if let Some(v) = parse_override(&lookup, "MAX_RETRIES")? {
        raw.scheduler.max_retries = v;
    }
    Ok(())
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    let parsed = value.trim().parse::<T>().map_err(|_| {
        CalcError::ConfigError(format!(
            "environment variable {key} must be a non-negative integer (got {value:?})"
        ))
    })?;
    debug!(key, value = %value.trim(), "applied environment override");
    Ok(Some(parsed))
}
