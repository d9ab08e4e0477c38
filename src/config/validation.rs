//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&PluginConfig → Result<(), Vec<ValidationError>>`
//! - Role-flag contradictions are reported by capability selection, not here

use thiserror::Error;

use super::schema::PluginConfig;
use crate::net::endpoint::EndpointDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("shutdown_grace_secs must be greater than zero")]
    ZeroGracePeriod,

    #[error("supported_versions must not be empty")]
    NoSupportedVersions,

    #[error("node_id must not be empty")]
    EmptyNodeId,

    #[error("invalid metrics_address {0:?}")]
    MetricsAddress(String),
}

pub fn validate_config(config: &PluginConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = EndpointDescriptor::parse(&config.endpoint) {
        errors.push(ValidationError::Endpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        });
    }
    if config.shutdown_grace_secs == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }
    if config.supported_versions.is_empty() {
        errors.push(ValidationError::NoSupportedVersions);
    }
    if config.node_id.trim().is_empty() {
        errors.push(ValidationError::EmptyNodeId);
    }
    if let Some(addr) = &config.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
