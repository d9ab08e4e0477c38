//! Identity surface: plugin name, version and supported protocol versions.

use async_trait::async_trait;
use serde_json::json;

use super::Service;
use crate::rpc::request::{CallContext, RpcRequest, Version};
use crate::rpc::response::{RpcError, RpcResult};

pub const PLUGIN_NAME: &str = "csi-blockdevices";

const METHODS: &[&str] = &["GetSupportedVersions", "GetPluginInfo"];

pub struct IdentityService {
    supported_versions: Vec<Version>,
}

impl IdentityService {
    pub fn new(supported_versions: Vec<Version>) -> Self {
        Self { supported_versions }
    }
}

#[async_trait]
impl Service for IdentityService {
    fn name(&self) -> &'static str {
        "csi.v0.Identity"
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    async fn call(&self, method: &str, _ctx: &CallContext, _request: RpcRequest) -> RpcResult {
        match method {
            "GetSupportedVersions" => Ok(json!({
                "supported_versions": self.supported_versions,
            })),
            "GetPluginInfo" => Ok(json!({
                "name": PLUGIN_NAME,
                "vendor_version": env!("CARGO_PKG_VERSION"),
                "manifest": {},
            })),
            other => Err(RpcError::Unimplemented(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::request::MethodPath;
    use serde_json::Value;

    fn call(method: &str) -> RpcRequest {
        RpcRequest::new(MethodPath::new("csi.v0.Identity", method), Value::Null)
    }

    #[tokio::test]
    async fn reports_plugin_info() {
        let svc = IdentityService::new(vec![Version::new(0, 1, 0)]);
        let info = svc
            .call("GetPluginInfo", &CallContext::new(), call("GetPluginInfo"))
            .await
            .unwrap();
        assert_eq!(info["name"], PLUGIN_NAME);
        assert_eq!(info["vendor_version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn lists_supported_versions() {
        let svc = IdentityService::new(vec![Version::new(0, 1, 0)]);
        let versions = svc
            .call("GetSupportedVersions", &CallContext::new(), call("GetSupportedVersions"))
            .await
            .unwrap();
        assert_eq!(
            versions["supported_versions"],
            serde_json::json!([{ "major": 0, "minor": 1, "patch": 0 }])
        );
    }
}
