//! Query execution.
//!
//! The executor borrows its row source immutably and never mutates rows it
//! receives. Data-dependent failures (missing columns, subquery cardinality,
//! budgets) surface here; shape failures were rejected at build time.

mod aggregate;
mod eval;
mod group;
mod join;
mod load;
mod mutation;
mod order;
mod scope;
mod window;


pub(crate) use load::LoadExecutor;
pub(crate) use mutation::MutationExecutor;

use crate::{
    db::{
        executor::{
            eval::{eval_expr, eval_predicate},
            scope::SingleRowContext,
        },
        query::{Expr, Predicate, QueryError, Source},
        row::Row,
    },
    value::Value,
};

/// Whether one stored row of `source` satisfies `predicate`.
///
/// Intended for bulk-mutation backends. The predicate must be free of
/// subqueries; sessions resolve them before calling the backend.
pub fn matches_row(source: Source, row: &Row, predicate: &Predicate) -> Result<bool, QueryError> {
    let ctx = SingleRowContext { source, row };

    Ok(eval_predicate(&ctx, predicate)?.is_true())
}

/// Evaluate an expression against one stored row of `source`.
pub fn eval_on_row(source: Source, row: &Row, expr: &Expr) -> Result<Value, QueryError> {
    let ctx = SingleRowContext { source, row };

    eval_expr(&ctx, expr)
}
