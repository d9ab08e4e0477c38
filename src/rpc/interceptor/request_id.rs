//! Correlation ID injection.

use async_trait::async_trait;

use super::{Interceptor, Next};
use crate::rpc::request::{CallContext, RequestId, RpcRequest};
use crate::rpc::response::RpcResult;

/// Attaches a generated request ID to calls that arrive without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdInjector;

#[async_trait]
impl Interceptor for RequestIdInjector {
    fn name(&self) -> &'static str {
        "request-id"
    }

    async fn intercept(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        next: Next<'_>,
    ) -> RpcResult {
        if ctx.request_id().is_none() {
            ctx.set_request_id(RequestId::generate());
        }
        next.run(ctx, request).await
    }
}
