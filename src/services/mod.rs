//! Capability surfaces hosted by the plugin.
//!
//! # Data Flow
//! ```text
//! node-only / controller-only flags
//!     → selection.rs (CapabilitySelection, validated once)
//!     → registry.rs  (identity + selected surfaces)
//!     → interceptor chain hands each call to the registry
//!     → identity.rs / controller.rs / node.rs
//! ```
//!
//! # Design Decisions
//! - Identity is always registered, whatever the selection
//! - Surfaces are opaque to the server shell: it only knows a service name
//!   and forwards calls by method name

pub mod controller;
pub mod identity;
pub mod node;
pub mod registry;
pub mod selection;

use async_trait::async_trait;

use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::RpcResult;

pub use controller::ControllerService;
pub use identity::IdentityService;
pub use node::NodeService;
pub use registry::{RegistryError, ServiceRegistry, Surfaces};
pub use selection::{select, Capability, CapabilitySelection, CapabilitySet, Misconfiguration};

/// A named group of RPC handlers registered with the server.
#[async_trait]
pub trait Service: Send + Sync {
    /// Fully qualified service name, e.g. `csi.v0.Node`.
    fn name(&self) -> &'static str;

    /// Methods this surface knows about.
    fn methods(&self) -> &'static [&'static str];

    async fn call(&self, method: &str, ctx: &CallContext, request: RpcRequest) -> RpcResult;
}
