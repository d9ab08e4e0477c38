//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Select capabilities → Parse endpoint → Bind listener
//!
//! Serving (guard.rs):
//!     start → register surfaces → accept loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Graceful stop (deferred until start if early)
//!         → Remove socket file
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown (every delivery)
//! ```
//!
//! # Design Decisions
//! - The guard is the only owner of the running server; everything else asks
//!   it to stop
//! - Shutdown has a timeout: a drain that outlives the grace period is aborted

pub mod guard;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use guard::{
    AcceptLoop, AcceptOutcome, LifecycleError, LifecycleGuard, ServerState, ShutdownRequest,
};
pub use shutdown::{remove_socket_file, CleanupError, ShutdownCoordinator, ShutdownPhase, ShutdownReport};
pub use signals::{ShutdownSignal, ShutdownSignals};
pub use startup::{prepare, Prepared, StartupError};
