//! Startup orchestration.
//!
//! # Responsibilities
//! - Decide which capability surfaces this process hosts
//! - Resolve the endpoint and bind its listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Capability selection happens before binding, so a misconfigured process
//!   never creates a socket file
//! - Listeners are acquired last; the server owns them from then on

use thiserror::Error;

use crate::config::{ConfigError, PluginConfig};
use crate::net::{EndpointDescriptor, Listener, ListenerError};
use crate::services::{select, CapabilitySelection};

/// Error type for startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// Everything the server needs before it starts serving.
#[derive(Debug)]
pub struct Prepared {
    pub selection: CapabilitySelection,
    pub endpoint: EndpointDescriptor,
    pub listener: Listener,
}

/// Select capabilities, then resolve and bind the endpoint.
pub async fn prepare(config: &PluginConfig) -> Result<Prepared, StartupError> {
    let selection =
        select(config.node_only, config.controller_only).map_err(ConfigError::from)?;
    tracing::info!(selection = ?selection, "Capabilities selected");

    let endpoint = EndpointDescriptor::parse(&config.endpoint)?;
    let listener = Listener::bind(&endpoint).await?;

    Ok(Prepared {
        selection,
        endpoint,
        listener,
    })
}
