//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (per-request spans carrying the request ID)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;
