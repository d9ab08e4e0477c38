//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at process start
//! - Pick verbosity from the debug toggle, overridable with `RUST_LOG`
//! - Select pretty or JSON output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "csi_blockdevices=debug,tower_http=debug"
    } else {
        "csi_blockdevices=info,tower_http=info"
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(debug).into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
