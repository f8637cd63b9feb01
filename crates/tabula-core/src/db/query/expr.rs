use crate::{
    db::{
        direction::Direction,
        query::{
            field::ColumnRef,
            intent::{OrderSpec, QuerySpec, SelectItem},
            predicate::{CompareOp, ComparePredicate, InList, LikeMode, Predicate},
        },
    },
    value::Value,
};
use derive_more::Display;
use std::fmt;

///
/// Expr
///
/// Value-producing expression tree. Evaluated per row, or per group when the
/// query aggregates.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Value),
    Aggregate(AggregateExpr),
    Arith {
        op: ArithOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Func(FuncExpr),
    Case(CaseExpr),
    /// Non-correlated scalar subquery; resolved once per execution.
    Subquery(Box<QuerySpec>),
}

///
/// AggregateKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum AggregateKind {
    #[display("avg")]
    Avg,
    #[display("count")]
    Count,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
    #[display("sum")]
    Sum,
}

///
/// AggregateExpr
/// `arg: None` is `count(*)`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateExpr {
    pub kind: AggregateKind,
    pub arg: Option<Box<Expr>>,
}

///
/// ArithOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ArithOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
}

///
/// FuncExpr
/// Scalar functions; all of them propagate null inputs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FuncExpr {
    Coalesce(Vec<Expr>),
    Concat(Vec<Expr>),
    Lower(Box<Expr>),
    Replace {
        expr: Box<Expr>,
        from: Box<Expr>,
        to: Box<Expr>,
    },
    StringValue(Box<Expr>),
    Upper(Box<Expr>),
}

///
/// CaseExpr
/// Searched case: first branch whose predicate is true wins.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseExpr {
    pub branches: Vec<(Predicate, Expr)>,
    pub otherwise: Box<Expr>,
}

impl Expr {
    ///
    /// CONSTRUCTORS
    ///

    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Value::Null)
    }

    /// `count(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate(AggregateExpr {
            kind: AggregateKind::Count,
            arg: None,
        })
    }

    #[must_use]
    pub fn subquery(spec: QuerySpec) -> Self {
        Self::Subquery(Box::new(spec))
    }

    #[must_use]
    pub fn coalesce(exprs: impl IntoIterator<Item = impl Into<Self>>) -> Self {
        Self::Func(FuncExpr::Coalesce(exprs.into_iter().map(Into::into).collect()))
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    fn compare(self, op: CompareOp, rhs: impl Into<Self>) -> Predicate {
        Predicate::Compare(ComparePredicate {
            left: self,
            op,
            right: rhs.into(),
        })
    }

    #[must_use]
    pub fn eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Eq, rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Ne, rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Gt, rhs)
    }

    #[must_use]
    pub fn goe(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Gte, rhs)
    }

    #[must_use]
    pub fn lt(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Lt, rhs)
    }

    #[must_use]
    pub fn loe(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(CompareOp::Lte, rhs)
    }

    #[must_use]
    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>) -> Predicate {
        Predicate::Between {
            expr: self,
            low: low.into(),
            high: high.into(),
        }
    }

    #[must_use]
    pub fn in_list(self, values: impl IntoIterator<Item = impl Into<Self>>) -> Predicate {
        Predicate::In {
            expr: self,
            list: InList::Values(values.into_iter().map(Into::into).collect()),
            negated: false,
        }
    }

    #[must_use]
    pub fn not_in(self, values: impl IntoIterator<Item = impl Into<Self>>) -> Predicate {
        Predicate::In {
            expr: self,
            list: InList::Values(values.into_iter().map(Into::into).collect()),
            negated: true,
        }
    }

    #[must_use]
    pub fn in_subquery(self, subquery: QuerySpec) -> Predicate {
        Predicate::In {
            expr: self,
            list: InList::Subquery(Box::new(subquery)),
            negated: false,
        }
    }

    /// SQL `LIKE`: `%` matches any run, `_` matches one character.
    #[must_use]
    pub fn like(self, pattern: impl Into<String>) -> Predicate {
        self.text_match(pattern.into(), LikeMode::Pattern, false)
    }

    #[must_use]
    pub fn like_ignore_case(self, pattern: impl Into<String>) -> Predicate {
        self.text_match(pattern.into(), LikeMode::Pattern, true)
    }

    /// Literal substring match; `%` and `_` in `needle` are ordinary characters.
    #[must_use]
    pub fn contains(self, needle: &str) -> Predicate {
        self.text_match(needle.to_string(), LikeMode::Contains, false)
    }

    #[must_use]
    pub fn starts_with(self, prefix: &str) -> Predicate {
        self.text_match(prefix.to_string(), LikeMode::StartsWith, false)
    }

    #[must_use]
    pub fn ends_with(self, suffix: &str) -> Predicate {
        self.text_match(suffix.to_string(), LikeMode::EndsWith, false)
    }

    const fn text_match(
        self,
        pattern: String,
        mode: LikeMode,
        case_insensitive: bool,
    ) -> Predicate {
        Predicate::Like {
            expr: self,
            pattern,
            mode,
            case_insensitive,
        }
    }

    #[must_use]
    pub fn is_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self,
            negated: false,
        }
    }

    #[must_use]
    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self,
            negated: true,
        }
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    fn aggregate(self, kind: AggregateKind) -> Self {
        Self::Aggregate(AggregateExpr {
            kind,
            arg: Some(Box::new(self)),
        })
    }

    /// Count of non-null values.
    #[must_use]
    pub fn count(self) -> Self {
        self.aggregate(AggregateKind::Count)
    }

    #[must_use]
    pub fn sum(self) -> Self {
        self.aggregate(AggregateKind::Sum)
    }

    /// Average; always a float, even over integer input.
    #[must_use]
    pub fn avg(self) -> Self {
        self.aggregate(AggregateKind::Avg)
    }

    #[must_use]
    pub fn min(self) -> Self {
        self.aggregate(AggregateKind::Min)
    }

    #[must_use]
    pub fn max(self) -> Self {
        self.aggregate(AggregateKind::Max)
    }

    // ------------------------------------------------------------------
    // Arithmetic and functions
    // ------------------------------------------------------------------

    fn arith(self, op: ArithOp, rhs: impl Into<Self>) -> Self {
        Self::Arith {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    #[must_use]
    pub fn add(self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Add, rhs)
    }

    #[must_use]
    pub fn subtract(self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Sub, rhs)
    }

    #[must_use]
    pub fn multiply(self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Mul, rhs)
    }

    /// Integer division by zero yields null.
    #[must_use]
    pub fn divide(self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Div, rhs)
    }

    /// Chained concatenation flattens into one `concat` node.
    #[must_use]
    pub fn concat(self, rhs: impl Into<Self>) -> Self {
        let rhs = rhs.into();
        match self {
            Self::Func(FuncExpr::Concat(mut parts)) => {
                parts.push(rhs);
                Self::Func(FuncExpr::Concat(parts))
            }
            lhs => Self::Func(FuncExpr::Concat(vec![lhs, rhs])),
        }
    }

    #[must_use]
    pub fn string_value(self) -> Self {
        Self::Func(FuncExpr::StringValue(Box::new(self)))
    }

    #[must_use]
    pub fn lower(self) -> Self {
        Self::Func(FuncExpr::Lower(Box::new(self)))
    }

    #[must_use]
    pub fn upper(self) -> Self {
        Self::Func(FuncExpr::Upper(Box::new(self)))
    }

    #[must_use]
    pub fn replace(self, from: impl Into<Self>, to: impl Into<Self>) -> Self {
        Self::Func(FuncExpr::Replace {
            expr: Box::new(self),
            from: Box::new(from.into()),
            to: Box::new(to.into()),
        })
    }

    /// Start a simple case expression on this value.
    #[must_use]
    pub fn when(self, value: impl Into<Self>) -> SimpleCaseWhen {
        SimpleCase::new(self).when(value)
    }

    // ------------------------------------------------------------------
    // Ordering and projection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn asc(self) -> OrderSpec {
        OrderSpec::new(self, Direction::Asc)
    }

    #[must_use]
    pub fn desc(self) -> OrderSpec {
        OrderSpec::new(self, Direction::Desc)
    }

    #[must_use]
    pub fn as_(self, label: &'static str) -> SelectItem {
        SelectItem::labelled(self, label)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Whether an aggregate appears anywhere outside nested subqueries.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.walk(&mut |expr| {
            if matches!(expr, Self::Aggregate(_)) {
                found = true;
            }
        });
        found
    }

    /// Visit this node and every child expression, including expressions
    /// inside case predicates. Subquery bodies are a separate scope and are
    /// not visited.
    pub fn walk(&self, f: &mut dyn FnMut(&Self)) {
        f(self);
        match self {
            Self::Column(_) | Self::Literal(_) | Self::Subquery(_) => {}
            Self::Aggregate(agg) => {
                if let Some(arg) = &agg.arg {
                    arg.walk(f);
                }
            }
            Self::Arith { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Self::Func(func) => func.for_each_arg(|arg| arg.walk(f)),
            Self::Case(case) => {
                for (predicate, result) in &case.branches {
                    predicate.for_each_expr(&mut |expr| expr.walk(f));
                    result.walk(f);
                }
                case.otherwise.walk(f);
            }
        }
    }

    /// Every column referenced outside nested subqueries.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnRef> {
        let mut out = Vec::new();
        self.walk(&mut |expr| {
            if let Self::Column(column) = expr {
                out.push(*column);
            }
        });
        out
    }

    /// Default select-list label: the bare column name for columns, the
    /// rendered expression otherwise.
    #[must_use]
    pub fn default_label(&self) -> String {
        match self {
            Self::Column(column) => column.name.to_string(),
            other => other.to_string(),
        }
    }
}

impl FuncExpr {
    pub(crate) fn for_each_arg(&self, mut f: impl FnMut(&Expr)) {
        match self {
            Self::Coalesce(args) | Self::Concat(args) => args.iter().for_each(f),
            Self::Lower(arg) | Self::Upper(arg) | Self::StringValue(arg) => f(arg),
            Self::Replace { expr, from, to } => {
                f(expr);
                f(from);
                f(to);
            }
        }
    }

    pub(crate) fn args_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Self::Coalesce(args) | Self::Concat(args) => args.iter_mut().collect(),
            Self::Lower(arg) | Self::Upper(arg) | Self::StringValue(arg) => vec![arg.as_mut()],
            Self::Replace { expr, from, to } => vec![expr.as_mut(), from.as_mut(), to.as_mut()],
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Coalesce(_) => "coalesce",
            Self::Concat(_) => "concat",
            Self::Lower(_) => "lower",
            Self::Replace { .. } => "replace",
            Self::StringValue(_) => "str",
            Self::Upper(_) => "upper",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Literal(Value::Text(text)) => write!(f, "'{text}'"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Aggregate(AggregateExpr { kind, arg: None }) => write!(f, "{kind}(*)"),
            Self::Aggregate(AggregateExpr {
                kind,
                arg: Some(arg),
            }) => write!(f, "{kind}({arg})"),
            Self::Arith { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Self::Func(func) => {
                write!(f, "{}(", func.name())?;
                let mut first = true;
                let mut result = Ok(());
                func.for_each_arg(|arg| {
                    if result.is_ok() {
                        result = if first {
                            write!(f, "{arg}")
                        } else {
                            write!(f, ", {arg}")
                        };
                    }
                    first = false;
                });
                result?;
                write!(f, ")")
            }
            Self::Case(case) => {
                write!(f, "case")?;
                for (_, result) in &case.branches {
                    write!(f, " when .. then {result}")?;
                }
                write!(f, " else {} end", case.otherwise)
            }
            Self::Subquery(_) => write!(f, "(subquery)"),
        }
    }
}

macro_rules! expr_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Self::Literal(Value::from(v))
                }
            }
        )*
    };
}

expr_from_literal!(bool, i32, i64, u32, f64, &str, String);

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<QuerySpec> for Expr {
    fn from(spec: QuerySpec) -> Self {
        Self::subquery(spec)
    }
}

///
/// CaseBuilder
///
/// Searched case: `CaseBuilder::new().when(p).then(a).otherwise(b)`.
///

#[derive(Clone, Debug, Default)]
pub struct CaseBuilder {
    branches: Vec<(Predicate, Expr)>,
}

impl CaseBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            branches: Vec::new(),
        }
    }

    #[must_use]
    pub fn when(self, predicate: Predicate) -> CaseWhen {
        CaseWhen {
            builder: self,
            predicate,
        }
    }

    #[must_use]
    pub fn otherwise(self, result: impl Into<Expr>) -> Expr {
        Expr::Case(CaseExpr {
            branches: self.branches,
            otherwise: Box::new(result.into()),
        })
    }
}

///
/// CaseWhen
/// Pending branch; completed by `then`.
///

#[derive(Clone, Debug)]
pub struct CaseWhen {
    builder: CaseBuilder,
    predicate: Predicate,
}

impl CaseWhen {
    #[must_use]
    pub fn then(mut self, result: impl Into<Expr>) -> CaseBuilder {
        self.builder.branches.push((self.predicate, result.into()));
        self.builder
    }
}

///
/// SimpleCase
///
/// Case on one subject value: `age.when(10).then("ten").otherwise("other")`.
/// Lowered to a searched case of equality branches.
///

#[derive(Clone, Debug)]
pub struct SimpleCase {
    subject: Expr,
    builder: CaseBuilder,
}

impl SimpleCase {
    #[must_use]
    pub const fn new(subject: Expr) -> Self {
        Self {
            subject,
            builder: CaseBuilder::new(),
        }
    }

    #[must_use]
    pub fn when(self, value: impl Into<Expr>) -> SimpleCaseWhen {
        let predicate = self.subject.clone().eq(value);
        SimpleCaseWhen {
            case: self,
            predicate,
        }
    }

    #[must_use]
    pub fn otherwise(self, result: impl Into<Expr>) -> Expr {
        self.builder.otherwise(result)
    }
}

///
/// SimpleCaseWhen
///

#[derive(Clone, Debug)]
pub struct SimpleCaseWhen {
    case: SimpleCase,
    predicate: Predicate,
}

impl SimpleCaseWhen {
    #[must_use]
    pub fn then(mut self, result: impl Into<Expr>) -> SimpleCase {
        self.case
            .builder
            .branches
            .push((self.predicate, result.into()));
        self.case
    }
}
