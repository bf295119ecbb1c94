//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! This module never touches the execution collaborator directly; repository
//! code reports through [`sink::record`] and nothing else.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::MetricsSnapshot;
pub use sink::{MetricsEvent, MetricsSink, metrics_reset_all, metrics_snapshot, with_metrics_sink};
