//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use super::schema::PluginConfig;

#[derive(Debug, Default, Parser)]
#[command(name = "csi-blockdevices")]
#[command(about = "CSI plugin host for local block devices", long_about = None)]
pub struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen endpoint (unix:///path/to.sock or tcp://host:port).
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Host only the node service.
    #[arg(long)]
    pub node_only: bool,

    /// Host only the controller service.
    #[arg(long)]
    pub controller_only: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,

    /// Override the device/socket directory.
    #[arg(long)]
    pub socket_dir: Option<PathBuf>,
}

impl Args {
    /// Overlay explicitly given flags onto `config`.
    ///
    /// Boolean flags can only switch a setting on.
    pub fn apply(&self, config: &mut PluginConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(dir) = &self.socket_dir {
            config.socket_dir = dir.clone();
        }
        config.node_only |= self.node_only;
        config.controller_only |= self.controller_only;
        config.debug |= self.debug;
    }
}
