//! Telemetry
//!
//! Observability components for the authorization server. Logging goes
//! through `tracing`; this module holds the metrics interface.

pub mod metrics;

pub use metrics::{
    create_in_memory_metrics, no_op_metrics, InMemoryMetrics, MetricEntry, MetricLabels,
    NoOpMetrics, ServerMetrics,
};
