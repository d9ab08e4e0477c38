//! Node-plane surface.

use async_trait::async_trait;
use serde_json::json;

use super::Service;
use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::{RpcError, RpcResult};

const METHODS: &[&str] = &[
    "NodeProbe",
    "NodeGetId",
    "NodeGetCapabilities",
    "NodePublishVolume",
    "NodeUnpublishVolume",
];

pub struct NodeService {
    node_id: String,
}

impl NodeService {
    pub fn new(node_id: String) -> Self {
        Self { node_id }
    }
}

#[async_trait]
impl Service for NodeService {
    fn name(&self) -> &'static str {
        "csi.v0.Node"
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    async fn call(&self, method: &str, _ctx: &CallContext, _request: RpcRequest) -> RpcResult {
        match method {
            "NodeProbe" => Ok(json!({})),
            "NodeGetId" => Ok(json!({ "node_id": self.node_id })),
            "NodeGetCapabilities" => Ok(json!({ "capabilities": [] })),
            other => Err(RpcError::Unimplemented(other.to_string())),
        }
    }
}
