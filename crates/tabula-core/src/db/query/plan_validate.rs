//! Build-time validation of query intent.
//!
//! Everything that can be decided from the declared source models is decided
//! here, so execution only ever fails on data (dynamic rows, subquery
//! cardinality, budgets) and never on query shape.

use crate::{
    db::query::{
        expr::{AggregateKind, Expr, FuncExpr},
        field::{ColumnRef, Source},
        intent::{QuerySpec, SelectList},
        predicate::{InList, Predicate},
    },
    model::ColumnModel,
    value::ValueKind,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// PlanError
///
/// Query-shape failures detected by `Query::build` and the mutation
/// builders. None of these depend on data.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum PlanError {
    #[error("aggregate '{expr}' is not allowed in {clause}")]
    AggregateInFilter { clause: &'static str, expr: String },

    #[error("column '{column}' must appear in group by or inside an aggregate")]
    AmbiguousGroupKey { column: String },

    #[error("'{modifier}' must follow a join")]
    DanglingJoinModifier { modifier: &'static str },

    #[error("alias '{alias}' is declared more than once")]
    DuplicateAlias { alias: &'static str },

    #[error("update requires at least one assignment")]
    EmptyAssignment,

    #[error("{field} must be non-negative, got {value}")]
    InvalidRange { field: &'static str, value: i64 },

    #[error("query has no select list")]
    MissingSelect,

    #[error("query has no source")]
    MissingSource,

    #[error("aggregate '{expr}' contains another aggregate")]
    NestedAggregate { expr: String },

    #[error("subquery must select exactly one column, found {found}")]
    SubqueryColumns { found: usize },

    #[error("unresolved column '{column}' in {clause}")]
    UnresolvedColumn { column: String, clause: &'static str },
}

/// Validate a frozen query against the models of its sources.
pub(crate) fn validate_query(spec: &QuerySpec) -> Result<(), PlanError> {
    if spec.from.is_empty() {
        return Err(PlanError::MissingSource);
    }

    let scope: Vec<Source> = spec.scope().collect();
    validate_aliases(&scope)?;

    // joins see the roots, earlier joins, and themselves
    for (i, join) in spec.joins.iter().enumerate() {
        let visible = &scope[..spec.from.len() + i + 1];
        validate_predicate(visible, &join.on, "join")?;
        reject_aggregates(&join.on, "join")?;
    }

    if let Some(filter) = &spec.filter {
        validate_predicate(&scope, filter, "where")?;
        reject_aggregates(filter, "where")?;
    }

    for key in &spec.group_by {
        validate_expr(&scope, key, "group by")?;
        if key.contains_aggregate() {
            return Err(PlanError::AggregateInFilter {
                clause: "group by",
                expr: key.to_string(),
            });
        }
    }

    let items = spec.select_items();
    for item in &items {
        validate_expr(&scope, &item.expr, "select")?;
    }
    if let Some(having) = &spec.having {
        validate_predicate(&scope, having, "having")?;
    }
    for order in &spec.order {
        validate_expr(&scope, &order.expr, "order by")?;
    }

    if spec.is_grouped() {
        validate_grouping(spec)?;
    }

    Ok(())
}

/// Validate a predicate that runs against exactly one source (bulk
/// mutations).
pub(crate) fn validate_single_source(
    source: Source,
    predicate: &Predicate,
    clause: &'static str,
) -> Result<(), PlanError> {
    validate_predicate(&[source], predicate, clause)?;
    reject_aggregates(predicate, clause)
}

pub(crate) fn validate_single_source_expr(
    source: Source,
    expr: &Expr,
    clause: &'static str,
) -> Result<(), PlanError> {
    validate_expr(&[source], expr, clause)?;
    if expr.contains_aggregate() {
        return Err(PlanError::AggregateInFilter {
            clause,
            expr: expr.to_string(),
        });
    }

    Ok(())
}

/// Resolve a column reference to its declared model.
fn resolve_column<'a>(
    scope: impl IntoIterator<Item = &'a Source>,
    column: ColumnRef,
    clause: &'static str,
) -> Result<&'static ColumnModel, PlanError> {
    scope
        .into_iter()
        .find(|source| source.alias() == column.source)
        .and_then(|source| source.model().column(column.name))
        .ok_or_else(|| PlanError::UnresolvedColumn {
            column: column.to_string(),
            clause,
        })
}

fn validate_aliases(scope: &[Source]) -> Result<(), PlanError> {
    let mut seen = BTreeSet::new();
    for source in scope {
        if !seen.insert(source.alias()) {
            return Err(PlanError::DuplicateAlias {
                alias: source.alias(),
            });
        }
    }

    Ok(())
}

fn validate_predicate(
    scope: &[Source],
    predicate: &Predicate,
    clause: &'static str,
) -> Result<(), PlanError> {
    let mut result = Ok(());
    predicate.for_each_expr(&mut |expr| {
        if result.is_ok() {
            result = validate_expr(scope, expr, clause);
        }
    });
    result?;

    for_each_in_subquery(predicate, &mut |subquery| {
        let found = subquery.select_items().len();
        if found == 1 {
            Ok(())
        } else {
            Err(PlanError::SubqueryColumns { found })
        }
    })
}

fn validate_expr(scope: &[Source], expr: &Expr, clause: &'static str) -> Result<(), PlanError> {
    let mut result = Ok(());
    expr.walk(&mut |node| {
        if result.is_err() {
            return;
        }
        result = match node {
            Expr::Column(column) => resolve_column(scope, *column, clause).map(|_| ()),
            Expr::Aggregate(agg) => match &agg.arg {
                Some(arg) if arg.contains_aggregate() => Err(PlanError::NestedAggregate {
                    expr: node.to_string(),
                }),
                _ => Ok(()),
            },
            Expr::Subquery(subquery) => {
                let found = subquery.select_items().len();
                if found == 1 {
                    Ok(())
                } else {
                    Err(PlanError::SubqueryColumns { found })
                }
            }
            _ => Ok(()),
        };
    });

    result
}

fn reject_aggregates(predicate: &Predicate, clause: &'static str) -> Result<(), PlanError> {
    let mut result = Ok(());
    predicate.for_each_expr(&mut |expr| {
        if result.is_ok() && expr.contains_aggregate() {
            result = Err(PlanError::AggregateInFilter {
                clause,
                expr: expr.to_string(),
            });
        }
    });

    result
}

fn for_each_in_subquery(
    predicate: &Predicate,
    f: &mut dyn FnMut(&QuerySpec) -> Result<(), PlanError>,
) -> Result<(), PlanError> {
    match predicate {
        Predicate::And(children) | Predicate::Or(children) => children
            .iter()
            .try_for_each(|child| for_each_in_subquery(child, f)),
        Predicate::Not(inner) => for_each_in_subquery(inner, f),
        Predicate::In {
            list: InList::Subquery(subquery),
            ..
        } => f(subquery),
        _ => Ok(()),
    }
}

// Grouped queries may only project group keys, aggregates, and
// expressions built from them.
fn validate_grouping(spec: &QuerySpec) -> Result<(), PlanError> {
    if let SelectList::Source(source) = &spec.select {
        let column = source.model().columns.first().map_or_else(
            || source.alias().to_string(),
            |column| ColumnRef::new(source.alias(), column.name).to_string(),
        );
        return Err(PlanError::AmbiguousGroupKey { column });
    }

    for item in spec.select_items() {
        check_grouped(&item.expr, &spec.group_by)?;
    }
    for order in &spec.order {
        check_grouped(&order.expr, &spec.group_by)?;
    }
    if let Some(having) = &spec.having {
        let mut result = Ok(());
        having.for_each_expr(&mut |expr| {
            if result.is_ok() {
                result = check_grouped(expr, &spec.group_by);
            }
        });
        result?;
    }

    Ok(())
}

fn check_grouped(expr: &Expr, group_by: &[Expr]) -> Result<(), PlanError> {
    if group_by.contains(expr) {
        return Ok(());
    }

    match expr {
        Expr::Column(column) => Err(PlanError::AmbiguousGroupKey {
            column: column.to_string(),
        }),
        Expr::Literal(_) | Expr::Aggregate(_) | Expr::Subquery(_) => Ok(()),
        Expr::Arith { lhs, rhs, .. } => {
            check_grouped(lhs, group_by)?;
            check_grouped(rhs, group_by)
        }
        Expr::Func(func) => {
            let mut result = Ok(());
            func.for_each_arg(|arg| {
                if result.is_ok() {
                    result = check_grouped(arg, group_by);
                }
            });
            result
        }
        Expr::Case(case) => {
            let mut result = Ok(());
            for (predicate, branch) in &case.branches {
                predicate.for_each_expr(&mut |operand| {
                    if result.is_ok() {
                        result = check_grouped(operand, group_by);
                    }
                });
                if result.is_err() {
                    return result;
                }
                check_grouped(branch, group_by)?;
            }
            check_grouped(&case.otherwise, group_by)
        }
    }
}

/// Statically inferred output kind of an expression, when knowable from
/// the declared models alone.
pub(crate) fn infer_kind(spec: &QuerySpec, expr: &Expr) -> Option<ValueKind> {
    match expr {
        Expr::Column(column) => spec
            .scope()
            .find(|source| source.alias() == column.source)
            .and_then(|source| source.model().column(column.name))
            .map(|column| column.kind),
        Expr::Literal(value) => Some(value.kind()),
        Expr::Aggregate(agg) => match agg.kind {
            AggregateKind::Count => Some(ValueKind::Int),
            AggregateKind::Avg => Some(ValueKind::Float),
            AggregateKind::Sum | AggregateKind::Min | AggregateKind::Max => {
                agg.arg.as_ref().and_then(|arg| infer_kind(spec, arg))
            }
        },
        Expr::Arith { lhs, rhs, .. } => match (infer_kind(spec, lhs)?, infer_kind(spec, rhs)?) {
            (ValueKind::Int, ValueKind::Int) => Some(ValueKind::Int),
            (l, r) if l.is_numeric() && r.is_numeric() => Some(ValueKind::Float),
            _ => None,
        },
        Expr::Func(FuncExpr::Coalesce(args)) => args
            .iter()
            .filter_map(|arg| infer_kind(spec, arg))
            .find(|kind| *kind != ValueKind::Null),
        Expr::Func(_) => Some(ValueKind::Text),
        Expr::Case(case) => case
            .branches
            .iter()
            .map(|(_, branch)| branch)
            .chain(std::iter::once(case.otherwise.as_ref()))
            .filter_map(|branch| infer_kind(spec, branch))
            .find(|kind| *kind != ValueKind::Null),
        Expr::Subquery(subquery) => subquery.output_kinds().into_iter().next().flatten(),
    }
}
