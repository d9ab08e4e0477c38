//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::args::Args;
use super::schema::{
    PluginConfig, CONTROLLER_ONLY_ENV, DEBUG_ENV, DEV_DIR_ENV, ENDPOINT_ENV, NODE_ID_ENV,
    NODE_ONLY_ENV,
};
use super::validation::{validate_config, ValidationError};
use crate::services::selection::Misconfiguration;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(#[from] Misconfiguration),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read configuration from a TOML file. Validation runs in `resolve_with`,
/// once every source has been applied.
pub fn load_config(path: &Path) -> Result<PluginConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment settings using `lookup` to read variables.
///
/// Role and debug flags are enabled by the variable being present at all,
/// whatever its value.
pub fn apply_env<F>(config: &mut PluginConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(endpoint) = non_empty(ENDPOINT_ENV) {
        config.endpoint = endpoint;
    }
    if let Some(dir) = non_empty(DEV_DIR_ENV) {
        config.socket_dir = dir.into();
    }
    if let Some(node_id) = non_empty(NODE_ID_ENV) {
        config.node_id = node_id;
    }
    config.node_only |= lookup(NODE_ONLY_ENV).is_some();
    config.controller_only |= lookup(CONTROLLER_ONLY_ENV).is_some();
    config.debug |= lookup(DEBUG_ENV).is_some();
}

/// Build the process configuration from every source, lowest precedence
/// first: defaults, config file, environment, command line.
pub fn resolve(args: &Args) -> Result<PluginConfig, ConfigError> {
    resolve_with(args, |key| {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    })
}

pub fn resolve_with<F>(args: &Args, lookup: F) -> Result<PluginConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PluginConfig::default(),
    };
    apply_env(&mut config, lookup);
    args.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
