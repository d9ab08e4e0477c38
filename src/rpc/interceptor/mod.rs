//! Request/response interceptor chain.
//!
//! # Data Flow
//! ```text
//! inbound call
//!     → request_id.rs  (attach correlation ID if absent)
//!     → logging.rs     (request logger: method + ID)
//!     → logging.rs     (response logger: outcome + duration, on the way out)
//!     → version.rs     (reject unsupported protocol versions)
//!     → validation.rs  (reject calls missing required fields)
//!     → capability handler
//! ```
//!
//! # Design Decisions
//! - Onion model: every stage receives `Next` and decides whether to call it,
//!   so "after" logic wraps everything further in
//! - Stage order is fixed when the chain is built; there is no way to add a
//!   stage to a chain the server already holds
//! - Validation sits inside the loggers so rejected calls are still logged

pub mod logging;
pub mod request_id;
pub mod validation;
pub mod version;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::rpc::request::{CallContext, RpcRequest, Version};
use crate::rpc::response::RpcResult;

pub use logging::{RequestLogger, ResponseLogger};
pub use request_id::RequestIdInjector;
pub use validation::RequestValidator;
pub use version::VersionValidator;

/// Innermost stage of the chain: the code that actually serves the call.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &CallContext, request: RpcRequest) -> RpcResult;
}

/// A middleware stage wrapping everything after it in the chain.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs and chain introspection.
    fn name(&self) -> &'static str;

    /// Process the call. Return without calling `next.run` to short-circuit.
    async fn intercept(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        next: Next<'_>,
    ) -> RpcResult;
}

/// The remainder of the chain, as seen from one stage.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Interceptor>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Invoke the next stage, or the handler once the stages are exhausted.
    pub async fn run(self, ctx: &mut CallContext, request: RpcRequest) -> RpcResult {
        match self.remaining.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    remaining: rest,
                    handler: self.handler,
                };
                stage.intercept(ctx, request, next).await
            }
            None => self.handler.handle(ctx, request).await,
        }
    }
}

/// Ordered, immutable sequence of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    stages: Arc<Vec<Arc<dyn Interceptor>>>,
}

impl InterceptorChain {
    pub fn new(stages: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            stages: Arc::new(stages),
        }
    }

    /// The canonical chain every served call passes through.
    pub fn standard(supported_versions: Vec<Version>) -> Self {
        Self::new(vec![
            Arc::new(RequestIdInjector),
            Arc::new(RequestLogger),
            Arc::new(ResponseLogger),
            Arc::new(VersionValidator::new(supported_versions)),
            Arc::new(RequestValidator),
        ])
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run one call through every stage and then `handler`.
    pub async fn call(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        handler: &dyn Handler,
    ) -> RpcResult {
        Next {
            remaining: &self.stages[..],
            handler,
        }
        .run(ctx, request)
        .await
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
