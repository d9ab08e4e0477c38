//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Interceptor chain and lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (per-call counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every call's log lines
//! - Metrics are recorded through the `metrics` facade; without an installed
//!   exporter they are no-ops

pub mod logging;
pub mod metrics;
