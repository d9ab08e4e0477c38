//! RPC protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! listener (TCP or unix socket)
//!     → server.rs (axum router: POST /{service}/{method})
//!     → request.rs (RpcRequest + CallContext, x-request-id header)
//!     → interceptor/ (request ID, logging, version, validation)
//!     → services::ServiceRegistry (capability surface)
//!     → response.rs (JSON result or {"error": {code, message}})
//! ```

pub mod interceptor;
pub mod request;
pub mod response;
pub mod server;

pub use interceptor::{Handler, Interceptor, InterceptorChain, Next};
pub use request::{CallContext, MethodPath, RequestId, RpcRequest, Version, X_REQUEST_ID};
pub use response::{RpcError, RpcResult};
pub use server::{PluginServer, ServerError};
