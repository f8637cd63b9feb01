use crate::db::query::{expr::Expr, intent::QuerySpec};
use derive_more::Display;
use std::ops::{BitAnd, BitOr, Not};

///
/// Predicate AST
///
/// Boolean tree over expressions. Building a predicate never fails and never
/// looks at a schema; column resolution happens when the query is built and
/// truth values are computed by the executor under three-valued logic.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CompareOp {
    #[display("=")]
    Eq,
    #[display("!=")]
    Ne,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
}

impl CompareOp {
    /// Operator with its operands swapped (`a < b` is `b > a`).
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
        }
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub left: Expr,
    pub op: CompareOp,
    pub right: Expr,
}

///
/// InList
/// Right-hand side of `in` / `not in`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InList {
    Values(Vec<Expr>),
    /// Single-column, non-correlated subquery.
    Subquery(Box<QuerySpec>),
}

///
/// LikeMode
/// `Pattern` honours `%` and `_`; the other modes match the text literally.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LikeMode {
    #[default]
    Pattern,
    Contains,
    StartsWith,
    EndsWith,
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
    },
    In {
        expr: Expr,
        list: InList,
        negated: bool,
    },
    Like {
        expr: Expr,
        pattern: String,
        mode: LikeMode,
        case_insensitive: bool,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
}

impl Predicate {
    /// Conjunction; nested conjunctions are flattened and `True` operands
    /// dropped.
    #[must_use]
    pub fn and(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::True, other) | (other, Self::True) => other,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, Self::And(mut right)) => {
                right.insert(0, left);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction; nested disjunctions are flattened and `False` operands
    /// dropped.
    #[must_use]
    pub fn or(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::False, other) | (other, Self::False) => other,
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, Self::Or(mut right)) => {
                right.insert(0, left);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    #[must_use]
    pub fn all(preds: impl IntoIterator<Item = Self>) -> Self {
        preds.into_iter().fold(Self::True, Self::and)
    }

    #[must_use]
    pub fn any(preds: impl IntoIterator<Item = Self>) -> Self {
        preds.into_iter().fold(Self::False, Self::or)
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Visit every expression operand, not descending into subqueries.
    pub fn for_each_expr(&self, f: &mut dyn FnMut(&Expr)) {
        match self {
            Self::True | Self::False => {}
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_expr(f);
                }
            }
            Self::Not(inner) => inner.for_each_expr(f),
            Self::Compare(cmp) => {
                f(&cmp.left);
                f(&cmp.right);
            }
            Self::Between { expr, low, high } => {
                f(expr);
                f(low);
                f(high);
            }
            Self::In { expr, list, .. } => {
                f(expr);
                if let InList::Values(values) = list {
                    values.iter().for_each(&mut *f);
                }
            }
            Self::Like { expr, .. } | Self::IsNull { expr, .. } => f(expr),
        }
    }

    /// Whether any operand contains an aggregate.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.for_each_expr(&mut |expr| found |= expr.contains_aggregate());
        found
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.clone().or(rhs.clone())
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
