//! Block-device CSI plugin host library.
//!
//! # Architecture Overview
//!
//! ```text
//!     config ──▶ lifecycle::startup ──▶ capability selection + bound listener
//!                                              │
//!                                              ▼
//!     CO call ──▶ net listener ──▶ rpc server ──▶ interceptor chain ──▶ services
//!                                      ▲
//!                                      │ start / graceful stop / force stop
//!                              lifecycle::guard ◀── lifecycle::shutdown ◀── signals
//! ```

// Core subsystems
pub mod config;
pub mod net;
pub mod rpc;
pub mod services;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::PluginConfig;
pub use lifecycle::{LifecycleGuard, ShutdownCoordinator};
pub use rpc::PluginServer;
pub use services::CapabilitySelection;
