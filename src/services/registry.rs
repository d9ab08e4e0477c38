//! Service registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::selection::{Capability, CapabilitySelection};
use super::{ControllerService, IdentityService, NodeService, Service};
use crate::config::PluginConfig;
use crate::rpc::interceptor::Handler;
use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::{RpcError, RpcResult};

/// Error type for registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("service {0} is already registered")]
    Duplicate(&'static str),
}

/// The concrete surfaces available to a selection.
#[derive(Clone)]
pub struct Surfaces {
    pub identity: Arc<dyn Service>,
    pub controller: Arc<dyn Service>,
    pub node: Arc<dyn Service>,
}

impl Surfaces {
    /// The block-device surfaces, configured from `config`.
    pub fn block_devices(config: &PluginConfig) -> Self {
        Self {
            identity: Arc::new(IdentityService::new(config.supported_versions.clone())),
            controller: Arc::new(ControllerService::new(
                config.socket_dir.clone(),
                config.private_dir(),
            )),
            node: Arc::new(NodeService::new(config.node_id.clone())),
        }
    }
}

/// Routes calls to registered services by name.
#[derive(Clone)]
pub struct ServiceRegistry {
    services: HashMap<&'static str, Arc<dyn Service>>,
}

impl ServiceRegistry {
    /// A registry hosting only the identity surface.
    pub fn new(identity: Arc<dyn Service>) -> Self {
        let mut services: HashMap<&'static str, Arc<dyn Service>> = HashMap::new();
        services.insert(identity.name(), identity);
        Self { services }
    }

    /// Identity plus every surface the selection enables.
    pub fn for_selection(selection: CapabilitySelection, surfaces: &Surfaces) -> Self {
        let mut registry = Self::new(surfaces.identity.clone());
        for capability in selection.capabilities().iter() {
            let service = match capability {
                Capability::ControlPlane => surfaces.controller.clone(),
                Capability::NodePlane => surfaces.node.clone(),
            };
            // Surfaces have distinct names, so this cannot collide.
            if let Err(e) = registry.register(service) {
                tracing::warn!(error = %e, "Skipping service registration");
            }
        }
        registry
    }

    pub fn register(&mut self, service: Arc<dyn Service>) -> Result<(), RegistryError> {
        let name = service.name();
        if self.services.contains_key(name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(service = name, "Added service");
        self.services.insert(name, service);
        Ok(())
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl Handler for ServiceRegistry {
    async fn handle(&self, ctx: &CallContext, request: RpcRequest) -> RpcResult {
        let service = self
            .services
            .get(request.method.service())
            .cloned()
            .ok_or_else(|| RpcError::NotFound(request.method.service().to_string()))?;
        let method = request.method.method().to_string();
        if !service.methods().contains(&method.as_str()) {
            return Err(RpcError::Unimplemented(request.method.to_string()));
        }
        service.call(&method, ctx, request).await
    }
}
