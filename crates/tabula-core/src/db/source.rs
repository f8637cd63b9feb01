use crate::{
    db::{
        query::{Assignment, Predicate, QueryError, Source},
        row::Row,
    },
    error::InternalError,
};
use std::sync::Arc;

///
/// RowSource
///
/// Read boundary of the executor. `scan` returns every row of the named
/// source; rows are shared and never mutated by the caller.
///

pub trait RowSource {
    fn scan(&self, source: &str) -> Result<Vec<Arc<Row>>, InternalError>;
}

///
/// BulkMutation
///
/// Write boundary for bulk update/delete. Predicates and assignment values
/// arrive free of subqueries and may be evaluated with
/// [`matches_row`](crate::db::executor::matches_row) and
/// [`eval_on_row`](crate::db::executor::eval_on_row). Both return the number
/// of rows affected.
///

pub trait BulkMutation {
    fn update(
        &self,
        target: Source,
        predicate: &Predicate,
        assignments: &[Assignment],
    ) -> Result<u64, QueryError>;

    fn delete(&self, target: Source, predicate: &Predicate) -> Result<u64, QueryError>;
}
