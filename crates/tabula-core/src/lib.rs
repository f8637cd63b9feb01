//! Core runtime for Tabula: values, schema descriptors, the typed query
//! builder, the execution engine, and observability.
#![warn(unreachable_pub)]

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Default cap on distinct groups materialized by one grouped execution.
pub const DEFAULT_MAX_GROUPS: u64 = 10_000;

/// Default cap on combined rows produced by the join stage.
pub const DEFAULT_MAX_JOIN_ROWS: u64 = 1_000_000;

///
/// Prelude
///
/// Prelude contains only query vocabulary.
/// Stores, sinks and executor internals are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        db::{
            Session,
            query::{
                CaseBuilder, Column, ColumnRef, ConditionBuilder, Delete, Direction, Expr,
                NullOrder, OptionalPredicate, Predicate, Query, QuerySpec, Relation, Source,
                TypedQuery, Update, and, or,
            },
            response::{Page, PageRequest, QueryResults},
            row::{Row, Tuple},
            store::MemoryStore,
        },
        model::{ColumnModel, SourceModel},
        value::{Value, ValueKind},
    };
}
