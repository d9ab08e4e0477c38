//! csi-blockdevices
//!
//! Serves the CSI identity, controller and node surfaces for raw block
//! devices over a unix socket or TCP endpoint.

use std::sync::Arc;

use clap::Parser;

use csi_blockdevices::config::{self, Args};
use csi_blockdevices::lifecycle::{startup, ShutdownCoordinator, ShutdownPhase, ShutdownSignals};
use csi_blockdevices::observability::{logging, metrics};
use csi_blockdevices::PluginServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::resolve(&args)?;

    logging::init_logging(config.debug, config.log_json);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %config.endpoint,
        socket_dir = %config.socket_dir.display(),
        "csi-blockdevices starting"
    );

    // Handlers go in before the socket exists; early signals queue up.
    let signals = ShutdownSignals::register()?;

    if let Some(address) = &config.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let prepared = match startup::prepare(&config).await {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let server = PluginServer::from_config(&config, prepared.selection);
    let coordinator = Arc::new(ShutdownCoordinator::new(server.guard(), prepared.endpoint));
    let mut phase = coordinator.subscribe();
    let _signals = coordinator.arm(signals);

    server.serve(prepared.listener).await?;

    // The accept loop ends before socket cleanup does.
    let _ = phase.wait_for(|p| *p == ShutdownPhase::Complete).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
