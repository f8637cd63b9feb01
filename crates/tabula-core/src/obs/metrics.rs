use crate::obs::sink::ExecKind;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for query execution.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub sources: BTreeMap<String, SourceCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Executor entrypoints
    pub load_calls: u64,
    pub count_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,

    // Rows touched
    pub rows_scanned: u64,
    pub rows_joined: u64,
    pub rows_loaded: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,

    pub groups_built: u64,
}

impl EventOps {
    pub(crate) const fn bump_calls(&mut self, kind: ExecKind) {
        let slot = match kind {
            ExecKind::Load => &mut self.load_calls,
            ExecKind::Count => &mut self.count_calls,
            ExecKind::Update => &mut self.update_calls,
            ExecKind::Delete => &mut self.delete_calls,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) const fn add_rows(&mut self, kind: ExecKind, rows: u64) {
        let slot = match kind {
            ExecKind::Load | ExecKind::Count => &mut self.rows_loaded,
            ExecKind::Update => &mut self.rows_updated,
            ExecKind::Delete => &mut self.rows_deleted,
        };
        *slot = slot.saturating_add(rows);
    }
}

///
/// SourceCounters
/// Counters keyed by the root source of each execution.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SourceCounters {
    pub load_calls: u64,
    pub count_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub rows_scanned: u64,
    pub rows_joined: u64,
    pub rows_loaded: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub groups_built: u64,
}

impl SourceCounters {
    pub(crate) const fn bump_calls(&mut self, kind: ExecKind) {
        let slot = match kind {
            ExecKind::Load => &mut self.load_calls,
            ExecKind::Count => &mut self.count_calls,
            ExecKind::Update => &mut self.update_calls,
            ExecKind::Delete => &mut self.delete_calls,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) const fn add_rows(&mut self, kind: ExecKind, rows: u64) {
        let slot = match kind {
            ExecKind::Load | ExecKind::Count => &mut self.rows_loaded,
            ExecKind::Update => &mut self.rows_updated,
            ExecKind::Delete => &mut self.rows_deleted,
        };
        *slot = slot.saturating_add(rows);
    }
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventOps,
    pub source_counters: Vec<SourceSummary>,
}

///
/// SourceSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub counters: SourceCounters,
    pub avg_rows_per_load: f64,
    pub avg_rows_scanned_per_load: f64,
}

/// Build a report from in-memory counters only.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let source_counters = snap
        .sources
        .into_iter()
        .map(|(source, counters)| {
            let loads = counters.load_calls;
            let (avg_rows_per_load, avg_rows_scanned_per_load) = if loads > 0 {
                (
                    counters.rows_loaded as f64 / loads as f64,
                    counters.rows_scanned as f64 / loads as f64,
                )
            } else {
                (0.0, 0.0)
            };

            SourceSummary {
                source,
                counters,
                avg_rows_per_load,
                avg_rows_scanned_per_load,
            }
        })
        .collect();

    EventReport {
        counters: snap.ops,
        source_counters,
    }
}
