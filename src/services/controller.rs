//! Control-plane surface.
//!
//! Volumes are the device nodes found in the plugin's device directory. The
//! private mount directory and hidden entries are not volumes.
//! Provisioning and attachment are not implemented by this host and answer
//! `Unimplemented`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Service;
use crate::rpc::request::{CallContext, RpcRequest};
use crate::rpc::response::{RpcError, RpcResult};

const METHODS: &[&str] = &[
    "ControllerProbe",
    "ControllerGetCapabilities",
    "ListVolumes",
    "CreateVolume",
    "DeleteVolume",
    "ControllerPublishVolume",
    "ControllerUnpublishVolume",
    "ValidateVolumeCapabilities",
    "GetCapacity",
];

pub struct ControllerService {
    device_dir: PathBuf,
    private_dir: PathBuf,
}

impl ControllerService {
    pub fn new(device_dir: PathBuf, private_dir: PathBuf) -> Self {
        Self {
            device_dir,
            private_dir,
        }
    }

    async fn probe(&self) -> RpcResult {
        match tokio::fs::metadata(&self.device_dir).await {
            Ok(meta) if meta.is_dir() => Ok(json!({})),
            Ok(_) => Err(RpcError::FailedPrecondition(format!(
                "{} is not a directory",
                self.device_dir.display()
            ))),
            Err(e) => Err(RpcError::FailedPrecondition(format!(
                "{}: {}",
                self.device_dir.display(),
                e
            ))),
        }
    }

    async fn list_volumes(&self) -> RpcResult {
        let mut dir = tokio::fs::read_dir(&self.device_dir)
            .await
            .map_err(|e| RpcError::Internal(format!("{}: {}", self.device_dir.display(), e)))?;

        let mut ids = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| RpcError::Internal(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path() == self.private_dir || name.starts_with('.') {
                continue;
            }
            ids.push(name);
        }
        ids.sort();

        let entries: Vec<Value> = ids
            .into_iter()
            .map(|id| {
                let path = self.device_dir.join(&id);
                json!({
                    "volume_info": {
                        "id": id,
                        "attributes": { "path": path.to_string_lossy() },
                    }
                })
            })
            .collect();

        Ok(json!({ "entries": entries }))
    }
}

#[async_trait]
impl Service for ControllerService {
    fn name(&self) -> &'static str {
        "csi.v0.Controller"
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    async fn call(&self, method: &str, _ctx: &CallContext, _request: RpcRequest) -> RpcResult {
        match method {
            "ControllerProbe" => self.probe().await,
            "ControllerGetCapabilities" => Ok(json!({
                "capabilities": [ { "rpc": { "type": "LIST_VOLUMES" } } ],
            })),
            "ListVolumes" => self.list_volumes().await,
            other => Err(RpcError::Unimplemented(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::request::MethodPath;

    fn call(method: &str) -> RpcRequest {
        RpcRequest::new(MethodPath::new("csi.v0.Controller", method), json!({}))
    }

    #[tokio::test]
    async fn lists_visible_devices_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sdc"), b"").unwrap();
        std::fs::write(dir.path().join("sdb"), b"").unwrap();
        std::fs::create_dir(dir.path().join(".mounts")).unwrap();
        std::fs::create_dir(dir.path().join("private")).unwrap();
        std::fs::write(dir.path().join(".lock"), b"").unwrap();

        let svc = ControllerService::new(dir.path().to_path_buf(), dir.path().join("private"));
        let out = svc
            .call("ListVolumes", &CallContext::new(), call("ListVolumes"))
            .await
            .unwrap();

        let ids: Vec<&str> = out["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["volume_info"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["sdb", "sdc"]);
    }

    #[tokio::test]
    async fn probe_requires_device_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ok = ControllerService::new(dir.path().to_path_buf(), dir.path().join(".mounts"));
        assert!(ok.call("ControllerProbe", &CallContext::new(), call("ControllerProbe")).await.is_ok());

        let missing = ControllerService::new(dir.path().join("absent"), dir.path().join(".mounts"));
        let err = missing
            .call("ControllerProbe", &CallContext::new(), call("ControllerProbe"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FAILED_PRECONDITION");
    }

    #[tokio::test]
    async fn provisioning_is_unimplemented() {
        let svc = ControllerService::new(
            PathBuf::from("/nonexistent"),
            PathBuf::from("/nonexistent/.mounts"),
        );
        let err = svc
            .call("CreateVolume", &CallContext::new(), call("CreateVolume"))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::Unimplemented("CreateVolume".into()));
    }
}
