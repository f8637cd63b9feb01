use crate::{
    db::{
        executor::LoadExecutor,
        query::{DeleteSpec, QueryError, UpdateSpec},
        source::BulkMutation,
    },
    obs::{ExecKind, MetricsEvent, MetricsSink},
};

///
/// MutationExecutor
///
/// Resolves subqueries in a bulk mutation, then hands it to the backend.
/// Callers holding cached views of affected rows must refresh them.
///

pub(crate) struct MutationExecutor<'a> {
    load: LoadExecutor<'a>,
    backend: &'a dyn BulkMutation,
    debug: bool,
    sink: &'a dyn MetricsSink,
}

impl<'a> MutationExecutor<'a> {
    pub(crate) const fn new(
        load: LoadExecutor<'a>,
        backend: &'a dyn BulkMutation,
        debug: bool,
        sink: &'a dyn MetricsSink,
    ) -> Self {
        Self {
            load,
            backend,
            debug,
            sink,
        }
    }

    pub(crate) fn update(&self, spec: &UpdateSpec) -> Result<u64, QueryError> {
        let source = spec.target().name();
        self.sink.record(MetricsEvent::ExecStart {
            kind: ExecKind::Update,
            source,
        });

        let mut filter = spec.filter().clone();
        self.load.lower_predicate(&mut filter)?;
        let mut assignments = spec.assignments().to_vec();
        for assignment in &mut assignments {
            self.load.lower_expr(&mut assignment.value)?;
        }

        let rows = self.backend.update(spec.target(), &filter, &assignments)?;
        if self.debug {
            tracing::debug!(
                source,
                assignments = assignments.len(),
                rows,
                "bulk update"
            );
        }

        self.sink.record(MetricsEvent::ExecFinish {
            kind: ExecKind::Update,
            source,
            rows_touched: rows,
        });

        Ok(rows)
    }

    pub(crate) fn delete(&self, spec: &DeleteSpec) -> Result<u64, QueryError> {
        let source = spec.target().name();
        self.sink.record(MetricsEvent::ExecStart {
            kind: ExecKind::Delete,
            source,
        });

        let mut filter = spec.filter().clone();
        self.load.lower_predicate(&mut filter)?;

        let rows = self.backend.delete(spec.target(), &filter)?;
        if self.debug {
            tracing::debug!(source, rows, "bulk delete");
        }

        self.sink.record(MetricsEvent::ExecFinish {
            kind: ExecKind::Delete,
            source,
            rows_touched: rows,
        });

        Ok(rows)
    }
}
