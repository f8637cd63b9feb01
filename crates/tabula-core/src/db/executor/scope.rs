use crate::{
    db::{
        executor::eval::EvalContext,
        query::{AggregateExpr, ColumnRef, Expr, PlanError, QueryError, QuerySpec, Source},
        row::Row,
    },
    error::InternalError,
    value::Value,
};
use std::sync::Arc;

///
/// Scope
/// Alias → slot mapping for one execution; roots first, then joins.
///

#[derive(Clone, Debug)]
pub(crate) struct Scope {
    sources: Vec<Source>,
}

impl Scope {
    pub(crate) fn from_spec(spec: &QuerySpec) -> Self {
        Self {
            sources: spec.scope().collect(),
        }
    }

    pub(crate) fn slot(&self, alias: &str) -> Option<usize> {
        self.sources.iter().position(|source| source.alias() == alias)
    }

    pub(crate) fn sources(&self) -> &[Source] {
        &self.sources
    }
}

///
/// JoinedRow
///
/// One combined row: a slot per source in scope. `None` is the absent side
/// of an unmatched left join; every column of it reads as null.
///

#[derive(Clone, Debug)]
pub(crate) struct JoinedRow {
    slots: Vec<Option<Arc<Row>>>,
}

impl JoinedRow {
    pub(crate) const fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn extended(&self, row: Option<Arc<Row>>) -> Self {
        let mut slots = Vec::with_capacity(self.slots.len() + 1);
        slots.extend(self.slots.iter().cloned());
        slots.push(row);

        Self { slots }
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Arc<Row>> {
        self.slots.get(index).and_then(Option::as_ref)
    }
}

///
/// RowContext
/// Evaluation over one joined row.
///

pub(crate) struct RowContext<'a> {
    pub(crate) scope: &'a Scope,
    pub(crate) row: &'a JoinedRow,
}

impl EvalContext for RowContext<'_> {
    fn column(&self, column: ColumnRef) -> Result<Value, QueryError> {
        let slot = self
            .scope
            .slot(column.source)
            .ok_or_else(|| missing_column(column))?;

        match self.row.slot(slot) {
            Some(row) => row
                .get(column.name)
                .cloned()
                .ok_or_else(|| missing_column(column)),
            None => Ok(Value::Null),
        }
    }

    fn aggregate(&self, aggregate: &AggregateExpr) -> Result<Value, QueryError> {
        Err(aggregate_outside_group(aggregate))
    }
}

///
/// SingleRowContext
/// Evaluation over one stored row of one source; used by bulk mutations.
///

pub(crate) struct SingleRowContext<'a> {
    pub(crate) source: Source,
    pub(crate) row: &'a Row,
}

impl EvalContext for SingleRowContext<'_> {
    fn column(&self, column: ColumnRef) -> Result<Value, QueryError> {
        if column.source != self.source.alias() {
            return Err(missing_column(column));
        }

        self.row
            .get(column.name)
            .cloned()
            .ok_or_else(|| missing_column(column))
    }

    fn aggregate(&self, aggregate: &AggregateExpr) -> Result<Value, QueryError> {
        Err(aggregate_outside_group(aggregate))
    }
}

// A row handed out by a source lacks a declared column.
pub(crate) fn missing_column(column: ColumnRef) -> QueryError {
    PlanError::UnresolvedColumn {
        column: column.to_string(),
        clause: "row",
    }
    .into()
}

fn aggregate_outside_group(aggregate: &AggregateExpr) -> QueryError {
    InternalError::executor_invariant(format!(
        "aggregate '{}' evaluated outside a grouped context",
        Expr::Aggregate(aggregate.clone())
    ))
    .into()
}
