//! Metrics sink boundary.
//!
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`. The
//! global sink is the only bridge into thread-local counter state.

use crate::obs::metrics;
use derive_more::Display;

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ExecKind {
    Load,
    Count,
    Update,
    Delete,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        source: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        source: &'static str,
        rows_touched: u64,
    },
    RowsScanned {
        source: &'static str,
        rows_scanned: u64,
    },
    JoinRows {
        source: &'static str,
        rows_joined: u64,
    },
    Groups {
        source: &'static str,
        groups: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink; folds events into thread-local counters.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, source } => {
                metrics::with_state_mut(|m| {
                    m.ops.bump_calls(kind);
                    m.sources.entry(source.to_string()).or_default().bump_calls(kind);
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                source,
                rows_touched,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.add_rows(kind, rows_touched);
                    m.sources
                        .entry(source.to_string())
                        .or_default()
                        .add_rows(kind, rows_touched);
                });
            }

            MetricsEvent::RowsScanned {
                source,
                rows_scanned,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                    let entry = m.sources.entry(source.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::JoinRows {
                source,
                rows_joined,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_joined = m.ops.rows_joined.saturating_add(rows_joined);
                    let entry = m.sources.entry(source.to_string()).or_default();
                    entry.rows_joined = entry.rows_joined.saturating_add(rows_joined);
                });
            }

            MetricsEvent::Groups { source, groups } => {
                metrics::with_state_mut(|m| {
                    m.ops.groups_built = m.ops.groups_built.saturating_add(groups);
                    let entry = m.sources.entry(source.to_string()).or_default();
                    entry.groups_built = entry.groups_built.saturating_add(groups);
                });
            }
        }
    }
}

///
/// NoopMetricsSink
/// Discards every event.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _: MetricsEvent) {}
}

pub(crate) static GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counters on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}
