use crate::{
    db::{
        executor::{
            eval::eval_predicate,
            scope::{JoinedRow, RowContext, Scope},
        },
        query::{JoinKind, JoinSpec, QueryError},
        row::Row,
    },
    error::InternalError,
};
use std::sync::Arc;

///
/// JoinBudget
/// Caps the rows materialized by the scan/join stage.
///

pub(crate) struct JoinBudget {
    produced: u64,
    limit: u64,
}

impl JoinBudget {
    pub(crate) const fn new(limit: u64) -> Self {
        Self { produced: 0, limit }
    }

    fn take(&mut self, rows: u64) -> Result<(), QueryError> {
        let attempted = self.produced.saturating_add(rows);
        if attempted > self.limit {
            return Err(InternalError::executor_unsupported(format!(
                "join execution limit exceeded (rows): attempted={attempted}, limit={}",
                self.limit
            ))
            .into());
        }
        self.produced = attempted;

        Ok(())
    }
}

/// Cross product of `left` with one more root source.
pub(crate) fn cross(
    left: Vec<JoinedRow>,
    right: &[Arc<Row>],
    budget: &mut JoinBudget,
) -> Result<Vec<JoinedRow>, QueryError> {
    let mut out = Vec::with_capacity(left.len().saturating_mul(right.len()));
    for row in &left {
        budget.take(right.len() as u64)?;
        out.extend(right.iter().map(|r| row.extended(Some(Arc::clone(r)))));
    }

    Ok(out)
}

/// Nested-loop join of `left` against the rows of `join.source`. Inner
/// joins drop unmatched left rows; left joins keep them with an absent
/// right side.
pub(crate) fn nested_loop_join(
    scope: &Scope,
    left: Vec<JoinedRow>,
    right: &[Arc<Row>],
    join: &JoinSpec,
    budget: &mut JoinBudget,
) -> Result<Vec<JoinedRow>, QueryError> {
    let mut out = Vec::new();

    for row in &left {
        let mut matched = false;

        for candidate in right {
            let combined = row.extended(Some(Arc::clone(candidate)));
            let ctx = RowContext {
                scope,
                row: &combined,
            };
            if eval_predicate(&ctx, &join.on)?.is_true() {
                budget.take(1)?;
                out.push(combined);
                matched = true;
            }
        }

        if !matched && join.kind == JoinKind::Left {
            budget.take(1)?;
            out.push(row.extended(None));
        }
    }

    Ok(out)
}
