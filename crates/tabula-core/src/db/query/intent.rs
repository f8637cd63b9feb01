use crate::{
    db::{
        direction::{Direction, NullOrder},
        query::{
            QueryError,
            expr::Expr,
            field::{Column, ColumnRef, Relation, Source},
            plan_validate::{PlanError, infer_kind, validate_query},
            predicate::Predicate,
        },
    },
    value::ValueKind,
};
use derive_more::Display;

///
/// Query
///
/// Fluent, order-independent accumulation of query intent.
///
/// Building is pure. Nothing is checked until `build`, which validates the
/// accumulated intent against the declared source models and freezes it into
/// an immutable [`QuerySpec`].
///

#[derive(Clone, Debug, Default)]
pub struct Query {
    select: Option<SelectList>,
    from: Vec<Source>,
    joins: Vec<JoinSpec>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    having: Option<Predicate>,
    distinct: bool,
    order: Vec<OrderSpec>,
    offset: Option<i64>,
    limit: Option<i64>,
    pending: Option<PlanError>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query with an explicit select list.
    #[must_use]
    pub fn select(items: impl IntoSelect) -> Self {
        Self {
            select: Some(SelectList::Items(items.into_select())),
            ..Self::default()
        }
    }

    /// Start a whole-row query over one source.
    #[must_use]
    pub fn select_from(source: Source) -> Self {
        Self {
            select: Some(SelectList::Source(source)),
            from: vec![source],
            ..Self::default()
        }
    }

    /// Add a root source. Several roots form a cross product.
    #[must_use]
    pub fn from(mut self, source: Source) -> Self {
        self.from.push(source);
        self
    }

    #[must_use]
    pub fn join(self, source: Source, on: Predicate) -> Self {
        self.push_join(source, JoinKind::Inner, on)
    }

    #[must_use]
    pub fn left_join(self, source: Source, on: Predicate) -> Self {
        self.push_join(source, JoinKind::Left, on)
    }

    /// Inner join along a declared relation.
    #[must_use]
    pub fn join_to(self, relation: Relation, target: Source) -> Self {
        self.join(target, relation.on(target))
    }

    /// Left join along a declared relation.
    #[must_use]
    pub fn left_join_to(self, relation: Relation, target: Source) -> Self {
        self.left_join(target, relation.on(target))
    }

    /// AND an extra condition into the most recent join.
    #[must_use]
    pub fn on(mut self, predicate: Predicate) -> Self {
        match self.joins.last_mut() {
            Some(join) => {
                let current = std::mem::replace(&mut join.on, Predicate::True);
                join.on = current.and(predicate);
            }
            None => self.record_pending(PlanError::DanglingJoinModifier { modifier: "on" }),
        }
        self
    }

    /// Mark the most recent join as a fetch join.
    #[must_use]
    pub fn fetch_join(mut self) -> Self {
        match self.joins.last_mut() {
            Some(join) => join.fetch = true,
            None => self.record_pending(PlanError::DanglingJoinModifier {
                modifier: "fetch_join",
            }),
        }
        self
    }

    /// AND a predicate into the where-clause.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// AND an optional predicate; `None` adds nothing.
    #[must_use]
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    /// AND every present predicate; absent ones are skipped.
    #[must_use]
    pub fn filter_all(self, predicates: impl IntoIterator<Item = Option<Predicate>>) -> Self {
        predicates.into_iter().fold(self, Self::filter_opt)
    }

    #[must_use]
    pub fn group_by(mut self, key: impl Into<Expr>) -> Self {
        self.group_by.push(key.into());
        self
    }

    #[must_use]
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Append one order key; earlier keys take precedence.
    #[must_use]
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order.push(order);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Maximum number of rows; `0` yields no rows.
    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate and freeze the accumulated intent.
    pub fn build(self) -> Result<QuerySpec, QueryError> {
        if let Some(err) = self.pending {
            return Err(err.into());
        }

        let page = PageSpec::from_raw(self.offset, self.limit)?;
        let select = self.select.ok_or(PlanError::MissingSelect)?;

        let spec = QuerySpec {
            select,
            from: self.from,
            joins: self.joins,
            filter: self.filter,
            group_by: self.group_by,
            having: self.having,
            distinct: self.distinct,
            order: self.order,
            page,
        };
        validate_query(&spec)?;

        Ok(spec)
    }

    fn push_join(mut self, source: Source, kind: JoinKind, on: Predicate) -> Self {
        self.joins.push(JoinSpec {
            source,
            kind,
            on,
            fetch: false,
        });
        self
    }

    fn record_pending(&mut self, err: PlanError) {
        if self.pending.is_none() {
            self.pending = Some(err);
        }
    }
}

///
/// QuerySpec
///
/// Immutable, validated query. Executing it never mutates it, so one spec
/// may be executed any number of times.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuerySpec {
    pub(crate) select: SelectList,
    pub(crate) from: Vec<Source>,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) filter: Option<Predicate>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Option<Predicate>,
    pub(crate) distinct: bool,
    pub(crate) order: Vec<OrderSpec>,
    pub(crate) page: PageSpec,
}

impl QuerySpec {
    #[must_use]
    pub const fn select_list(&self) -> &SelectList {
        &self.select
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.from
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    #[must_use]
    pub const fn having(&self) -> Option<&Predicate> {
        self.having.as_ref()
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn order(&self) -> &[OrderSpec] {
        &self.order
    }

    #[must_use]
    pub const fn page(&self) -> PageSpec {
        self.page
    }

    /// Every alias in scope: root sources first, then joins in order.
    pub fn scope(&self) -> impl Iterator<Item = Source> + '_ {
        self.from
            .iter()
            .copied()
            .chain(self.joins.iter().map(|join| join.source))
    }

    /// The select list with whole-row selections expanded to their columns.
    #[must_use]
    pub fn select_items(&self) -> Vec<SelectItem> {
        match &self.select {
            SelectList::Items(items) => items.clone(),
            SelectList::Source(source) => source
                .model()
                .columns
                .iter()
                .map(|column| {
                    SelectItem::new(Expr::Column(ColumnRef::new(source.alias(), column.name)))
                })
                .collect(),
        }
    }

    /// Whether rows are aggregated before projection.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
            || self.having.is_some()
            || self.select_items().iter().any(|item| item.expr.contains_aggregate())
            || self.order.iter().any(|order| order.expr.contains_aggregate())
    }

    /// Same query with an explicit window; used by page requests.
    #[must_use]
    pub fn with_window(&self, offset: u64, limit: Option<u64>) -> Self {
        Self {
            page: PageSpec { offset, limit },
            ..self.clone()
        }
    }

    /// Statically inferred kind per select item; `None` when unknown.
    #[must_use]
    pub fn output_kinds(&self) -> Vec<Option<ValueKind>> {
        self.select_items()
            .iter()
            .map(|item| infer_kind(self, &item.expr))
            .collect()
    }
}

///
/// SelectList
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectList {
    /// Whole rows of one source (`select_from`).
    Source(Source),
    Items(Vec<SelectItem>),
}

///
/// SelectItem
/// One projected expression with an optional alias.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub label: Option<&'static str>,
}

impl SelectItem {
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, label: None }
    }

    #[must_use]
    pub const fn labelled(expr: Expr, label: &'static str) -> Self {
        Self {
            expr,
            label: Some(label),
        }
    }

    /// Output label: the alias, else the expression's default label.
    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .map_or_else(|| self.expr.default_label(), ToString::to_string)
    }
}

///
/// IntoSelect
///
/// Anything accepted by `Query::select`: one item, a tuple of items, or a
/// vector of items.
///

pub trait IntoSelect {
    fn into_select(self) -> Vec<SelectItem>;
}

///
/// IntoSelectItem
///

pub trait IntoSelectItem {
    fn into_select_item(self) -> SelectItem;
}

impl IntoSelectItem for SelectItem {
    fn into_select_item(self) -> SelectItem {
        self
    }
}

impl IntoSelectItem for Expr {
    fn into_select_item(self) -> SelectItem {
        SelectItem::new(self)
    }
}

impl<T> IntoSelectItem for Column<T> {
    fn into_select_item(self) -> SelectItem {
        SelectItem::new(self.into())
    }
}

impl IntoSelect for SelectItem {
    fn into_select(self) -> Vec<SelectItem> {
        vec![self]
    }
}

impl IntoSelect for Expr {
    fn into_select(self) -> Vec<SelectItem> {
        vec![SelectItem::new(self)]
    }
}

impl<T> IntoSelect for Column<T> {
    fn into_select(self) -> Vec<SelectItem> {
        vec![self.into_select_item()]
    }
}

impl<I: IntoSelectItem> IntoSelect for Vec<I> {
    fn into_select(self) -> Vec<SelectItem> {
        self.into_iter().map(IntoSelectItem::into_select_item).collect()
    }
}

macro_rules! impl_into_select_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoSelectItem),+> IntoSelect for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_select(self) -> Vec<SelectItem> {
                let ($($name,)+) = self;
                vec![$($name.into_select_item()),+]
            }
        }
    };
}

impl_into_select_tuple!(A, B);
impl_into_select_tuple!(A, B, C);
impl_into_select_tuple!(A, B, C, D);
impl_into_select_tuple!(A, B, C, D, E);
impl_into_select_tuple!(A, B, C, D, E, F);

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum JoinKind {
    #[display("inner")]
    Inner,
    #[display("left")]
    Left,
}

///
/// JoinSpec
///
/// One join step. `on` may reference the aliases joined before this step
/// plus this step's own alias.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinSpec {
    pub source: Source,
    pub kind: JoinKind,
    pub on: Predicate,
    pub fetch: bool,
}

///
/// OrderSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: Direction,
    /// `None` defers to the executor's configured default.
    pub nulls: Option<NullOrder>,
}

impl OrderSpec {
    #[must_use]
    pub const fn new(expr: Expr, direction: Direction) -> Self {
        Self {
            expr,
            direction,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrder::First);
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrder::Last);
        self
    }
}

///
/// PageSpec
/// Validated offset/limit window.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PageSpec {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl PageSpec {
    fn from_raw(offset: Option<i64>, limit: Option<i64>) -> Result<Self, PlanError> {
        let offset = match offset {
            Some(raw) => u64::try_from(raw).map_err(|_| PlanError::InvalidRange {
                field: "offset",
                value: raw,
            })?,
            None => 0,
        };
        let limit = limit
            .map(|raw| {
                u64::try_from(raw).map_err(|_| PlanError::InvalidRange {
                    field: "limit",
                    value: raw,
                })
            })
            .transpose()?;

        Ok(Self { offset, limit })
    }

    #[must_use]
    pub const fn is_windowed(self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }
}
