//! Typed query builder.
//!
//! Expressions and predicates are plain values; `Query` accumulates them and
//! `build` freezes the result into a validated [`QuerySpec`]. Choosing a
//! projection yields a [`TypedQuery`] that a `Session` executes.

mod expr;
mod field;
mod intent;
mod mutation;
mod plan_validate;
mod predicate;
mod projection;

#[cfg(test)]
mod tests;

use crate::{db::response::ResponseError, error::InternalError};
use thiserror::Error as ThisError;

// re-exports
pub use crate::db::direction::{Direction, NullOrder};
pub use expr::{
    AggregateExpr, AggregateKind, ArithOp, CaseBuilder, CaseExpr, CaseWhen, Expr, FuncExpr,
    SimpleCase, SimpleCaseWhen,
};
pub use field::{Column, ColumnRef, Relation, Source};
pub use intent::{
    IntoSelect, IntoSelectItem, JoinKind, JoinSpec, OrderSpec, PageSpec, Query, QuerySpec,
    SelectItem, SelectList,
};
pub use mutation::{Assignment, Delete, DeleteSpec, Update, UpdateSpec};
pub use plan_validate::PlanError;
pub use predicate::{
    CompareOp, ComparePredicate, ConditionBuilder, InList, LikeMode, OptionalPredicate, Predicate,
    and, or,
};
pub use projection::{
    AsBean, AsConstructor, AsEntity, AsRow, AsScalar, AsTuple, Bean, EntityRow, FetchedRow,
    FromTuple, ProjectedRow, ProjectionArgs, ProjectionError, Projector, TypedQuery,
};

///
/// QueryError
///
/// Every failure a query can produce, from building through execution.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum QueryError {
    #[error("{0}")]
    Execute(#[from] InternalError),

    #[error("{0}")]
    Plan(#[from] PlanError),

    #[error("{0}")]
    Projection(#[from] ProjectionError),

    #[error("{0}")]
    Response(#[from] ResponseError),

    #[error("scalar subquery returned {rows} row(s) of {columns} column(s)")]
    SubqueryShape { rows: usize, columns: usize },
}
