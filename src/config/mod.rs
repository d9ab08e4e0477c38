//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → BDPLUGIN_* / CSI_ENDPOINT environment (loader.rs)
//!     → command-line flags (args.rs)
//!     → validation.rs (semantic checks)
//!     → PluginConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the capability selection derived from
//!   it holds for the whole process lifetime
//! - All fields have defaults to allow an empty environment
//! - Role flags in the environment are presence-based: set means enabled

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{resolve, ConfigError};
pub use schema::PluginConfig;
