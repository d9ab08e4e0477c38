//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::rpc::request::Version;

/// Endpoint the plugin listens on.
pub const ENDPOINT_ENV: &str = "CSI_ENDPOINT";
/// Restrict the plugin to the node surface.
pub const NODE_ONLY_ENV: &str = "BDPLUGIN_NODEONLY";
/// Restrict the plugin to the controller surface.
pub const CONTROLLER_ONLY_ENV: &str = "BDPLUGIN_CONTROLLERONLY";
/// Raise log verbosity.
pub const DEBUG_ENV: &str = "BDPLUGIN_DEBUG";
/// Override the device/socket directory.
pub const DEV_DIR_ENV: &str = "BDPLUGIN_DEVDIR";
/// Override the reported node ID.
pub const NODE_ID_ENV: &str = "BDPLUGIN_NODEID";

pub const DEFAULT_ENDPOINT: &str = "unix:///run/csi/csi-blockdevices.sock";
pub const DEFAULT_SOCKET_DIR: &str = "/dev/disk/csi-blockdevices";

/// Root configuration for the plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Endpoint to listen on (`unix://<path>` or `tcp://<host:port>`).
    pub endpoint: String,

    /// Host only the node surface.
    pub node_only: bool,

    /// Host only the controller surface.
    pub controller_only: bool,

    /// Debug-level logging.
    pub debug: bool,

    /// Emit logs as JSON lines.
    pub log_json: bool,

    /// Directory holding the plugin's device nodes.
    pub socket_dir: PathBuf,

    /// Identifier reported by `NodeGetId`.
    pub node_id: String,

    /// Upper bound on graceful drain before the server is forced down.
    pub shutdown_grace_secs: u64,

    /// Prometheus listener address, disabled when unset.
    pub metrics_address: Option<String>,

    /// Protocol versions accepted from callers.
    pub supported_versions: Vec<Version>,
}

impl PluginConfig {
    /// Private mount area inside the device directory.
    pub fn private_dir(&self) -> PathBuf {
        self.socket_dir.join(".mounts")
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            node_only: false,
            controller_only: false,
            debug: false,
            log_json: false,
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            node_id: "localhost".to_string(),
            shutdown_grace_secs: 10,
            metrics_address: None,
            supported_versions: vec![Version::new(0, 1, 0)],
        }
    }
}
