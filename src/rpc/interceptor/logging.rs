//! Request and response logging.
//!
//! Two separate stages so the request line is emitted before any validation
//! runs, and the response line reports whatever the inner stages decided.

use async_trait::async_trait;

use super::{Interceptor, Next};
use crate::observability::metrics;
use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::RpcResult;

fn request_id(ctx: &CallContext) -> &str {
    ctx.request_id().map(|id| id.as_str()).unwrap_or("-")
}

/// Logs the method and correlation ID of each call before it is served.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

#[async_trait]
impl Interceptor for RequestLogger {
    fn name(&self) -> &'static str {
        "request-logger"
    }

    async fn intercept(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        next: Next<'_>,
    ) -> RpcResult {
        tracing::info!(
            request_id = %request_id(ctx),
            method = %request.method,
            "RPC request"
        );
        tracing::debug!(
            request_id = %request_id(ctx),
            payload = %request.payload,
            "RPC request payload"
        );
        next.run(ctx, request).await
    }
}

/// Logs the outcome and duration of each call, and records call metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseLogger;

#[async_trait]
impl Interceptor for ResponseLogger {
    fn name(&self) -> &'static str {
        "response-logger"
    }

    async fn intercept(
        &self,
        ctx: &mut CallContext,
        request: RpcRequest,
        next: Next<'_>,
    ) -> RpcResult {
        let method = request.method.to_string();

        let result = next.run(ctx, request).await;
        let elapsed = ctx.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    request_id = %request_id(ctx),
                    method = %method,
                    outcome = "ok",
                    duration_ms = elapsed.as_millis() as u64,
                    "RPC response"
                );
                metrics::record_call(&method, "ok", elapsed);
            }
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id(ctx),
                    method = %method,
                    outcome = err.code(),
                    duration_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "RPC response"
                );
                metrics::record_call(&method, err.code(), elapsed);
            }
        }

        result
    }
}
