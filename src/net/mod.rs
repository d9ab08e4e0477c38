//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! endpoint string (config / CSI_ENDPOINT)
//!     → endpoint.rs (parse into scheme + address)
//!     → listener.rs (bind TCP or unix socket)
//!     → handed to the lifecycle guard, which owns it from then on
//! ```
//!
//! # Design Decisions
//! - Only the scheme matters after binding: it decides whether shutdown has
//!   a socket file to clean up
//! - Stale socket files are removed before binding, not after a crash

pub mod endpoint;
pub mod listener;

pub use endpoint::{EndpointDescriptor, Scheme};
pub use listener::{Listener, ListenerError};
