use crate::{
    config::ExecutorConfig,
    db::{
        executor::{
            eval::{EvalContext, eval_expr, eval_predicate},
            group::{GroupContext, group_rows},
            join::{JoinBudget, cross, nested_loop_join},
            order::{OrderKey, sort_by_keys},
            scope::{JoinedRow, RowContext, Scope},
            window::apply_window,
        },
        query::{
            Expr, FetchedRow, InList, Predicate, ProjectedRow, QueryError, QuerySpec,
            SelectItem, SelectList,
        },
        row::{Row, Tuple},
        source::RowSource,
    },
    obs::{ExecKind, MetricsEvent, MetricsSink},
    value::Value,
};
use std::{collections::HashSet, sync::Arc};

///
/// LoadExecutor
///
/// Runs one query against a row source:
/// subqueries → scan/join → where → group/having → project → distinct →
/// order → window.
///

pub(crate) struct LoadExecutor<'a> {
    source: &'a dyn RowSource,
    config: ExecutorConfig,
    debug: bool,
    sink: &'a dyn MetricsSink,
}

///
/// Output
/// One projected row plus its evaluated sort keys.
///

struct Output {
    row: ProjectedRow,
    keys: Vec<Value>,
}

impl<'a> LoadExecutor<'a> {
    pub(crate) const fn new(
        source: &'a dyn RowSource,
        config: ExecutorConfig,
        debug: bool,
        sink: &'a dyn MetricsSink,
    ) -> Self {
        Self {
            source,
            config,
            debug,
            sink,
        }
    }

    /// Execute and return projected rows in final order.
    pub(crate) fn execute(&self, spec: &QuerySpec) -> Result<Vec<ProjectedRow>, QueryError> {
        let root = root_name(spec);
        self.sink.record(MetricsEvent::ExecStart {
            kind: ExecKind::Load,
            source: root,
        });

        let mut pairs: Vec<(ProjectedRow, Vec<Value>)> = self
            .run(spec, true)?
            .into_iter()
            .map(|output| (output.row, output.keys))
            .collect();
        sort_by_keys(&mut pairs, &self.order_keys(spec));
        let mut rows: Vec<ProjectedRow> = pairs.into_iter().map(|(row, _)| row).collect();

        let before = rows.len();
        apply_window(&mut rows, spec.page());
        if self.debug {
            tracing::debug!(
                source = root,
                offset = spec.page().offset,
                limit = ?spec.page().limit,
                before,
                after = rows.len(),
                "window applied"
            );
        }

        self.sink.record(MetricsEvent::ExecFinish {
            kind: ExecKind::Load,
            source: root,
            rows_touched: rows.len() as u64,
        });

        Ok(rows)
    }

    /// Number of rows the query yields without its window.
    pub(crate) fn count(&self, spec: &QuerySpec) -> Result<u64, QueryError> {
        let root = root_name(spec);
        self.sink.record(MetricsEvent::ExecStart {
            kind: ExecKind::Count,
            source: root,
        });

        let count = self.run(spec, false)?.len() as u64;
        if self.debug {
            tracing::debug!(source = root, count, "count computed");
        }

        self.sink.record(MetricsEvent::ExecFinish {
            kind: ExecKind::Count,
            source: root,
            rows_touched: count,
        });

        Ok(count)
    }

    // Everything up to and including distinct.
    fn run(&self, spec: &QuerySpec, with_keys: bool) -> Result<Vec<Output>, QueryError> {
        let spec = self.lower_query(spec)?;
        let scope = Scope::from_spec(&spec);
        let root = root_name(&spec);

        let rows = self.scan_and_join(&spec, &scope)?;
        let before = rows.len();
        let rows = match spec.filter() {
            Some(filter) => filter_rows(&scope, rows, filter)?,
            None => rows,
        };
        if self.debug {
            tracing::debug!(source = root, before, after = rows.len(), "where applied");
        }

        let items = spec.select_items();
        let order_exprs: Vec<&Expr> = if with_keys {
            spec.order().iter().map(|order| &order.expr).collect()
        } else {
            Vec::new()
        };
        let fetch_slots = fetch_slots(&spec, &scope);

        let mut outputs = Vec::new();
        if spec.is_grouped() {
            let groups = group_rows(&scope, rows, spec.group_by(), self.config.max_groups)?;
            self.sink.record(MetricsEvent::Groups {
                source: root,
                groups: groups.len() as u64,
            });
            if self.debug {
                tracing::debug!(source = root, groups = groups.len(), "rows grouped");
            }

            for group in &groups {
                let ctx = GroupContext {
                    scope: &scope,
                    rows: &group.rows,
                };
                if let Some(having) = spec.having()
                    && !eval_predicate(&ctx, having)?.is_true()
                {
                    continue;
                }
                let fetched = group
                    .rows
                    .first()
                    .map(|row| fetched_rows(&fetch_slots, row))
                    .unwrap_or_default();
                outputs.push(project(&ctx, &items, &order_exprs, fetched)?);
            }
        } else {
            for row in &rows {
                let ctx = RowContext { scope: &scope, row };
                let fetched = fetched_rows(&fetch_slots, row);
                outputs.push(project(&ctx, &items, &order_exprs, fetched)?);
            }
        }

        if spec.is_distinct() {
            let before = outputs.len();
            let mut seen = HashSet::new();
            outputs.retain(|output| seen.insert(output.row.tuple.values().to_vec()));
            if self.debug {
                tracing::debug!(source = root, before, after = outputs.len(), "distinct applied");
            }
        }

        Ok(outputs)
    }

    fn scan_and_join(
        &self,
        spec: &QuerySpec,
        scope: &Scope,
    ) -> Result<Vec<JoinedRow>, QueryError> {
        let mut budget = JoinBudget::new(self.config.max_join_rows);
        let mut rows = vec![JoinedRow::empty()];

        for source in spec.sources() {
            let scanned = self.scan(source.name())?;
            rows = cross(rows, &scanned, &mut budget)?;
        }

        for join in spec.joins() {
            let scanned = self.scan(join.source.name())?;
            rows = nested_loop_join(scope, rows, &scanned, join, &mut budget)?;
            if self.debug {
                tracing::debug!(
                    alias = join.source.alias(),
                    kind = %join.kind,
                    fetch = join.fetch,
                    rows = rows.len(),
                    "join applied"
                );
            }
        }

        if !spec.joins().is_empty() || spec.sources().len() > 1 {
            self.sink.record(MetricsEvent::JoinRows {
                source: root_name(spec),
                rows_joined: rows.len() as u64,
            });
        }

        Ok(rows)
    }

    fn scan(&self, name: &'static str) -> Result<Vec<Arc<Row>>, QueryError> {
        let rows = self.source.scan(name)?;
        self.sink.record(MetricsEvent::RowsScanned {
            source: name,
            rows_scanned: rows.len() as u64,
        });
        if self.debug {
            tracing::debug!(source = name, rows = rows.len(), "scan");
        }

        Ok(rows)
    }

    fn order_keys(&self, spec: &QuerySpec) -> Vec<OrderKey> {
        spec.order()
            .iter()
            .map(|order| OrderKey {
                direction: order.direction,
                nulls: order.nulls.unwrap_or(self.config.null_order),
            })
            .collect()
    }

    //
    // Subquery lowering
    //
    // Subqueries are non-correlated: each one runs once, before the outer
    // query, and is replaced by its result.
    //

    pub(crate) fn lower_query(&self, spec: &QuerySpec) -> Result<QuerySpec, QueryError> {
        let mut spec = spec.clone();

        if let SelectList::Items(items) = &mut spec.select {
            for item in items {
                self.lower_expr(&mut item.expr)?;
            }
        }
        for join in &mut spec.joins {
            self.lower_predicate(&mut join.on)?;
        }
        if let Some(filter) = &mut spec.filter {
            self.lower_predicate(filter)?;
        }
        for key in &mut spec.group_by {
            self.lower_expr(key)?;
        }
        if let Some(having) = &mut spec.having {
            self.lower_predicate(having)?;
        }
        for order in &mut spec.order {
            self.lower_expr(&mut order.expr)?;
        }

        Ok(spec)
    }

    pub(crate) fn lower_predicate(&self, predicate: &mut Predicate) -> Result<(), QueryError> {
        match predicate {
            Predicate::True | Predicate::False => Ok(()),
            Predicate::And(children) | Predicate::Or(children) => children
                .iter_mut()
                .try_for_each(|child| self.lower_predicate(child)),
            Predicate::Not(inner) => self.lower_predicate(inner),
            Predicate::Compare(cmp) => {
                self.lower_expr(&mut cmp.left)?;
                self.lower_expr(&mut cmp.right)
            }
            Predicate::Between { expr, low, high } => {
                self.lower_expr(expr)?;
                self.lower_expr(low)?;
                self.lower_expr(high)
            }
            Predicate::In { expr, list, .. } => {
                self.lower_expr(expr)?;
                match list {
                    InList::Values(values) => values
                        .iter_mut()
                        .try_for_each(|value| self.lower_expr(value)),
                    InList::Subquery(subquery) => {
                        let values = self.list_subquery(subquery)?;
                        *list = InList::Values(values.into_iter().map(Expr::Literal).collect());
                        Ok(())
                    }
                }
            }
            Predicate::Like { expr, .. } | Predicate::IsNull { expr, .. } => self.lower_expr(expr),
        }
    }

    pub(crate) fn lower_expr(&self, expr: &mut Expr) -> Result<(), QueryError> {
        match expr {
            Expr::Column(_) | Expr::Literal(_) => Ok(()),
            Expr::Subquery(subquery) => {
                let value = self.scalar_subquery(subquery)?;
                *expr = Expr::Literal(value);
                Ok(())
            }
            Expr::Aggregate(aggregate) => match &mut aggregate.arg {
                Some(arg) => self.lower_expr(arg),
                None => Ok(()),
            },
            Expr::Arith { lhs, rhs, .. } => {
                self.lower_expr(lhs)?;
                self.lower_expr(rhs)
            }
            Expr::Func(func) => func
                .args_mut()
                .into_iter()
                .try_for_each(|arg| self.lower_expr(arg)),
            Expr::Case(case) => {
                for (predicate, result) in &mut case.branches {
                    self.lower_predicate(predicate)?;
                    self.lower_expr(result)?;
                }
                self.lower_expr(&mut case.otherwise)
            }
        }
    }

    fn scalar_subquery(&self, subquery: &QuerySpec) -> Result<Value, QueryError> {
        let mut values = self.list_subquery(subquery)?;
        match values.len() {
            0 => Ok(Value::Null),
            1 => Ok(values.remove(0)),
            rows => Err(QueryError::SubqueryShape { rows, columns: 1 }),
        }
    }

    fn list_subquery(&self, subquery: &QuerySpec) -> Result<Vec<Value>, QueryError> {
        let rows = self.execute(subquery)?;
        let mut values = Vec::with_capacity(rows.len());

        for row in rows {
            let columns = row.tuple.len();
            let mut tuple_values = row.tuple.into_values();
            if columns != 1 {
                return Err(QueryError::SubqueryShape {
                    rows: values.len() + 1,
                    columns,
                });
            }
            values.push(tuple_values.remove(0));
        }

        if self.debug {
            tracing::debug!(source = root_name(subquery), values = values.len(), "subquery resolved");
        }

        Ok(values)
    }
}

fn root_name(spec: &QuerySpec) -> &'static str {
    spec.sources().first().map_or("", |source| source.name())
}

fn filter_rows(
    scope: &Scope,
    rows: Vec<JoinedRow>,
    filter: &Predicate,
) -> Result<Vec<JoinedRow>, QueryError> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if eval_predicate(&RowContext { scope, row: &row }, filter)?.is_true() {
            kept.push(row);
        }
    }

    Ok(kept)
}

fn project(
    ctx: &dyn EvalContext,
    items: &[SelectItem],
    order: &[&Expr],
    fetched: Vec<FetchedRow>,
) -> Result<Output, QueryError> {
    let mut labels = Vec::with_capacity(items.len());
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        labels.push(item.label());
        values.push(eval_expr(ctx, &item.expr)?);
    }

    let keys = order
        .iter()
        .map(|expr| eval_expr(ctx, expr))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Output {
        row: ProjectedRow {
            tuple: Tuple::new(labels, values),
            fetched,
        },
        keys,
    })
}

// (alias, slot) for every fetch join of a whole-row query.
fn fetch_slots(spec: &QuerySpec, scope: &Scope) -> Vec<(&'static str, usize)> {
    if !matches!(spec.select_list(), SelectList::Source(_)) {
        return Vec::new();
    }

    spec.joins()
        .iter()
        .filter(|join| join.fetch)
        .filter_map(|join| {
            scope
                .slot(join.source.alias())
                .map(|slot| (join.source.alias(), slot))
        })
        .collect()
}

fn fetched_rows(slots: &[(&'static str, usize)], row: &JoinedRow) -> Vec<FetchedRow> {
    slots
        .iter()
        .map(|&(alias, slot)| FetchedRow {
            alias,
            row: row.slot(slot).map(|row| Row::clone(row)),
        })
        .collect()
}
