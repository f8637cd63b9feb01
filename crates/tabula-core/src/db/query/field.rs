use crate::{
    db::query::{
        expr::{Expr, SimpleCase, SimpleCaseWhen},
        intent::{OrderSpec, QuerySpec, SelectItem},
        predicate::Predicate,
    },
    model::SourceModel,
    value::{FieldValue, ValueKind},
};
use std::{fmt, marker::PhantomData};

///
/// Source
///
/// Aliasable handle on a declared source. Two handles over the same model
/// with different aliases are independent scopes (`member` vs `memberSub`).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Source {
    model: &'static SourceModel,
    alias: &'static str,
}

impl Source {
    /// Handle aliased by the model name.
    #[must_use]
    pub const fn new(model: &'static SourceModel) -> Self {
        Self {
            model,
            alias: model.name,
        }
    }

    #[must_use]
    pub const fn aliased(model: &'static SourceModel, alias: &'static str) -> Self {
        Self { model, alias }
    }

    #[must_use]
    pub const fn model(self) -> &'static SourceModel {
        self.model
    }

    /// Name the row source knows this source by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.model.name
    }

    #[must_use]
    pub const fn alias(self) -> &'static str {
        self.alias
    }

    /// Typed handle on one column of this source.
    #[must_use]
    pub const fn column<T: FieldValue>(self, name: &'static str) -> Column<T> {
        Column::new(self.alias, name)
    }

    /// `count(*)` over the rows of the query this source belongs to.
    #[must_use]
    pub fn count(self) -> Expr {
        Expr::count_all()
    }
}

///
/// ColumnRef
///
/// Untyped `(alias, column)` descriptor; owns no data.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ColumnRef {
    pub source: &'static str,
    pub name: &'static str,
}

impl ColumnRef {
    #[must_use]
    pub const fn new(source: &'static str, name: &'static str) -> Self {
        Self { source, name }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source, self.name)
    }
}

///
/// Column
///
/// Typed column handle. Literal comparisons take values convertible into the
/// declared Rust type; column-to-column and subquery comparisons go through
/// the `*_expr` variants.
///

pub struct Column<T> {
    column: ColumnRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.column).finish()
    }
}

impl<T> PartialEq for Column<T> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
    }
}

impl<T> Eq for Column<T> {}

impl<T: FieldValue> Column<T> {
    #[must_use]
    pub const fn new(source: &'static str, name: &'static str) -> Self {
        Self {
            column: ColumnRef::new(source, name),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn column_ref(self) -> ColumnRef {
        self.column
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.column.name
    }

    #[must_use]
    pub const fn kind(self) -> ValueKind {
        T::KIND
    }

    #[must_use]
    pub const fn expr(self) -> Expr {
        Expr::Column(self.column)
    }

    fn literal(value: impl Into<T>) -> Expr {
        Expr::Literal(value.into().to_value())
    }

    // ------------------------------------------------------------------
    // Literal comparisons
    // ------------------------------------------------------------------

    #[must_use]
    pub fn eq(self, value: impl Into<T>) -> Predicate {
        self.expr().eq(Self::literal(value))
    }

    #[must_use]
    pub fn ne(self, value: impl Into<T>) -> Predicate {
        self.expr().ne(Self::literal(value))
    }

    #[must_use]
    pub fn gt(self, value: impl Into<T>) -> Predicate {
        self.expr().gt(Self::literal(value))
    }

    /// Greater than or equal.
    #[must_use]
    pub fn goe(self, value: impl Into<T>) -> Predicate {
        self.expr().goe(Self::literal(value))
    }

    #[must_use]
    pub fn lt(self, value: impl Into<T>) -> Predicate {
        self.expr().lt(Self::literal(value))
    }

    /// Less than or equal.
    #[must_use]
    pub fn loe(self, value: impl Into<T>) -> Predicate {
        self.expr().loe(Self::literal(value))
    }

    /// Inclusive range.
    #[must_use]
    pub fn between(self, low: impl Into<T>, high: impl Into<T>) -> Predicate {
        self.expr()
            .between(Self::literal(low), Self::literal(high))
    }

    #[must_use]
    pub fn in_list<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.expr().in_list(values.into_iter().map(Self::literal))
    }

    #[must_use]
    pub fn not_in<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.expr().not_in(values.into_iter().map(Self::literal))
    }

    #[must_use]
    pub fn in_subquery(self, subquery: QuerySpec) -> Predicate {
        self.expr().in_subquery(subquery)
    }

    #[must_use]
    pub fn like(self, pattern: impl Into<String>) -> Predicate {
        self.expr().like(pattern)
    }

    #[must_use]
    pub fn contains(self, needle: &str) -> Predicate {
        self.expr().contains(needle)
    }

    #[must_use]
    pub fn starts_with(self, prefix: &str) -> Predicate {
        self.expr().starts_with(prefix)
    }

    #[must_use]
    pub fn ends_with(self, suffix: &str) -> Predicate {
        self.expr().ends_with(suffix)
    }

    #[must_use]
    pub fn is_null(self) -> Predicate {
        self.expr().is_null()
    }

    #[must_use]
    pub fn is_not_null(self) -> Predicate {
        self.expr().is_not_null()
    }

    // ------------------------------------------------------------------
    // Expression comparisons
    // ------------------------------------------------------------------

    #[must_use]
    pub fn eq_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().eq(rhs)
    }

    #[must_use]
    pub fn ne_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().ne(rhs)
    }

    #[must_use]
    pub fn gt_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().gt(rhs)
    }

    #[must_use]
    pub fn goe_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().goe(rhs)
    }

    #[must_use]
    pub fn lt_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().lt(rhs)
    }

    #[must_use]
    pub fn loe_expr(self, rhs: impl Into<Expr>) -> Predicate {
        self.expr().loe(rhs)
    }

    // ------------------------------------------------------------------
    // Ordering, aggregates, projections
    // ------------------------------------------------------------------

    #[must_use]
    pub fn asc(self) -> OrderSpec {
        self.expr().asc()
    }

    #[must_use]
    pub fn desc(self) -> OrderSpec {
        self.expr().desc()
    }

    #[must_use]
    pub fn count(self) -> Expr {
        self.expr().count()
    }

    #[must_use]
    pub fn sum(self) -> Expr {
        self.expr().sum()
    }

    #[must_use]
    pub fn avg(self) -> Expr {
        self.expr().avg()
    }

    #[must_use]
    pub fn min(self) -> Expr {
        self.expr().min()
    }

    #[must_use]
    pub fn max(self) -> Expr {
        self.expr().max()
    }

    #[must_use]
    pub fn add(self, rhs: impl Into<Expr>) -> Expr {
        self.expr().add(rhs)
    }

    #[must_use]
    pub fn multiply(self, rhs: impl Into<Expr>) -> Expr {
        self.expr().multiply(rhs)
    }

    #[must_use]
    pub fn concat(self, rhs: impl Into<Expr>) -> Expr {
        self.expr().concat(rhs)
    }

    #[must_use]
    pub fn string_value(self) -> Expr {
        self.expr().string_value()
    }

    #[must_use]
    pub fn lower(self) -> Expr {
        self.expr().lower()
    }

    /// Start a simple case expression on this column.
    #[must_use]
    pub fn when(self, value: impl Into<T>) -> SimpleCaseWhen {
        SimpleCase::new(self.expr()).when(Self::literal(value))
    }

    /// Select this column under another label.
    #[must_use]
    pub fn as_(self, label: &'static str) -> SelectItem {
        self.expr().as_(label)
    }
}

impl<T> From<Column<T>> for Expr {
    fn from(column: Column<T>) -> Self {
        Self::Column(column.column)
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

///
/// Relation
///
/// Declared association between a foreign-key column and the key column of a
/// target source; `member.team` joins on `member.team_id = team.id`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Relation {
    pub from: ColumnRef,
    pub target_column: &'static str,
}

impl Relation {
    #[must_use]
    pub const fn new(from: ColumnRef, target_column: &'static str) -> Self {
        Self {
            from,
            target_column,
        }
    }

    /// Join predicate against one aliased target.
    #[must_use]
    pub fn on(self, target: Source) -> Predicate {
        Expr::Column(self.from).eq(Expr::Column(ColumnRef::new(
            target.alias(),
            self.target_column,
        )))
    }
}
