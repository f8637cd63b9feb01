//! Observability: runtime counters and the sink abstraction.
//!
//! Execution code never touches counter state directly; it emits
//! `MetricsEvent`s into whatever `MetricsSink` its session carries.

pub(crate) mod metrics;
pub(crate) mod sink;

#[cfg(test)]
mod tests;

// re-exports
pub use metrics::{EventOps, EventReport, SourceCounters, SourceSummary};
pub use sink::{
    ExecKind, GlobalMetricsSink, MetricsEvent, MetricsSink, NoopMetricsSink, metrics_report,
    metrics_reset_all,
};
