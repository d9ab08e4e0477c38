//! RPC server setup.
//!
//! # Responsibilities
//! - Build the axum router that feeds every call through the interceptor chain
//! - Register the surfaces chosen by capability selection
//! - Run the accept loop through the lifecycle guard and classify how it ended

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::config::PluginConfig;
use crate::lifecycle::guard::{AcceptOutcome, LifecycleError, LifecycleGuard, ServerState};
use crate::net::Listener;
use crate::rpc::interceptor::InterceptorChain;
use crate::rpc::request::{CallContext, MethodPath, RequestId, RpcRequest, X_REQUEST_ID};
use crate::rpc::response::RpcError;
use crate::services::{CapabilitySelection, ServiceRegistry, Surfaces};

/// Errors that end the server shell.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("transport failed: {0}")]
    Transport(#[source] io::Error),
}

/// State shared by every call.
struct Dispatcher {
    registry: ServiceRegistry,
    chain: InterceptorChain,
}

/// Build the HTTP router serving `registry` behind `chain`.
pub fn router(registry: ServiceRegistry, chain: InterceptorChain) -> Router {
    let state = Arc::new(Dispatcher { registry, chain });
    Router::new()
        .route("/{service}/{method}", post(rpc_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn rpc_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((service, method)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut ctx = match headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        Some(id) => CallContext::with_request_id(RequestId::from(id.to_string())),
        None => CallContext::new(),
    };

    let payload = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(service = %service, method = %method, error = %e, "Malformed request body");
                return RpcError::InvalidArgument(format!("malformed request body: {e}"))
                    .into_response();
            }
        }
    };

    let request = RpcRequest::new(MethodPath::new(service, method), payload);
    let result = dispatcher
        .chain
        .call(&mut ctx, request, &dispatcher.registry)
        .await;

    let mut response = match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    };
    if let Some(value) = ctx
        .request_id()
        .and_then(|id| HeaderValue::from_str(id.as_str()).ok())
    {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// The plugin's server shell.
pub struct PluginServer {
    guard: Arc<LifecycleGuard>,
    registry: ServiceRegistry,
    chain: InterceptorChain,
}

impl PluginServer {
    pub fn new(registry: ServiceRegistry, chain: InterceptorChain, grace: Duration) -> Self {
        Self {
            guard: Arc::new(LifecycleGuard::new(grace)),
            registry,
            chain,
        }
    }

    /// Server hosting the block-device surfaces enabled by `selection`.
    pub fn from_config(config: &PluginConfig, selection: CapabilitySelection) -> Self {
        let registry = ServiceRegistry::for_selection(selection, &Surfaces::block_devices(config));
        let chain = InterceptorChain::standard(config.supported_versions.clone());
        Self::new(
            registry,
            chain,
            Duration::from_secs(config.shutdown_grace_secs),
        )
    }

    /// The lifecycle guard, for handing to the shutdown coordinator.
    pub fn guard(&self) -> Arc<LifecycleGuard> {
        self.guard.clone()
    }

    /// Serve on `listener` until the server is stopped.
    ///
    /// Returns `Ok` when the accept loop ended because the guard stopped it,
    /// and `ServerError::Transport` when the listener failed on its own. A
    /// shutdown requested before the server started stops it immediately.
    pub async fn serve(&self, listener: Listener) -> Result<(), ServerError> {
        let accept_loop = self
            .guard
            .start(listener, self.registry.clone(), self.chain.clone())
            .await?;

        if accept_loop.stop_pending() {
            self.guard.request_graceful_stop().await;
        }

        let outcome = accept_loop.wait().await;
        self.finish(outcome).await
    }

    async fn finish(&self, outcome: AcceptOutcome) -> Result<(), ServerError> {
        match outcome {
            AcceptOutcome::Drained | AcceptOutcome::Aborted => {
                tracing::info!("Server stopped");
                Ok(())
            }
            AcceptOutcome::Failed(e) => {
                if self.guard.state().await == ServerState::Stopped {
                    tracing::debug!(error = %e, "Accept loop error after stop");
                    return Ok(());
                }
                self.guard.request_force_stop().await;
                tracing::error!(error = %e, "Transport failed");
                Err(ServerError::Transport(e))
            }
        }
    }
}
