//! Expression and predicate evaluation.
//!
//! Predicates use three-valued logic: comparisons involving null or
//! incomparable values are unknown, and only `True` keeps a row.

use crate::{
    db::query::{
        AggregateExpr, ArithOp, ColumnRef, CompareOp, ComparePredicate, Expr, FuncExpr, InList,
        LikeMode, Predicate, QueryError,
    },
    error::InternalError,
    value::{Value, strict_eq, strict_order_cmp},
};
use std::cmp::Ordering;

///
/// EvalContext
///
/// What an expression can see: column values of the current row, and
/// aggregates over the current group.
///

pub(crate) trait EvalContext {
    fn column(&self, column: ColumnRef) -> Result<Value, QueryError>;

    fn aggregate(&self, aggregate: &AggregateExpr) -> Result<Value, QueryError>;
}

///
/// Truth
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    const fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Unknown,
        }
    }

    const fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    pub(crate) const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    const fn and(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    const fn or(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    const fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

pub(crate) fn eval_expr(ctx: &dyn EvalContext, expr: &Expr) -> Result<Value, QueryError> {
    match expr {
        Expr::Column(column) => ctx.column(*column),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Aggregate(aggregate) => ctx.aggregate(aggregate),
        Expr::Arith { op, lhs, rhs } => arith(*op, eval_expr(ctx, lhs)?, eval_expr(ctx, rhs)?),
        Expr::Func(func) => eval_func(ctx, func),
        Expr::Case(case) => {
            for (predicate, result) in &case.branches {
                if eval_predicate(ctx, predicate)?.is_true() {
                    return eval_expr(ctx, result);
                }
            }
            eval_expr(ctx, &case.otherwise)
        }
        Expr::Subquery(_) => {
            Err(InternalError::executor_invariant("subquery reached evaluation unresolved").into())
        }
    }
}

pub(crate) fn eval_predicate(
    ctx: &dyn EvalContext,
    predicate: &Predicate,
) -> Result<Truth, QueryError> {
    let truth = match predicate {
        Predicate::True => Truth::True,
        Predicate::False => Truth::False,
        Predicate::And(children) => {
            let mut acc = Truth::True;
            for child in children {
                acc = acc.and(eval_predicate(ctx, child)?);
                if acc == Truth::False {
                    break;
                }
            }
            acc
        }
        Predicate::Or(children) => {
            let mut acc = Truth::False;
            for child in children {
                acc = acc.or(eval_predicate(ctx, child)?);
                if acc == Truth::True {
                    break;
                }
            }
            acc
        }
        Predicate::Not(inner) => eval_predicate(ctx, inner)?.not(),
        Predicate::Compare(cmp) => eval_compare(ctx, cmp)?,
        Predicate::Between { expr, low, high } => {
            let value = eval_expr(ctx, expr)?;
            let low = eval_expr(ctx, low)?;
            let high = eval_expr(ctx, high)?;

            compare(&value, CompareOp::Gte, &low).and(compare(&value, CompareOp::Lte, &high))
        }
        Predicate::In {
            expr,
            list,
            negated,
        } => {
            let InList::Values(values) = list else {
                return Err(InternalError::executor_invariant(
                    "in-subquery reached evaluation unresolved",
                )
                .into());
            };
            let value = eval_expr(ctx, expr)?;
            let mut acc = Truth::False;
            for candidate in values {
                let candidate = eval_expr(ctx, candidate)?;
                acc = acc.or(Truth::from_option(strict_eq(&value, &candidate)));
                if acc == Truth::True {
                    break;
                }
            }

            if *negated { acc.not() } else { acc }
        }
        Predicate::Like {
            expr,
            pattern,
            mode,
            case_insensitive,
        } => match eval_expr(ctx, expr)?.render() {
            None => Truth::Unknown,
            Some(text) if *case_insensitive => Truth::from_bool(text_matches(
                *mode,
                &pattern.to_lowercase(),
                &text.to_lowercase(),
            )),
            Some(text) => Truth::from_bool(text_matches(*mode, pattern, &text)),
        },
        Predicate::IsNull { expr, negated } => {
            Truth::from_bool(eval_expr(ctx, expr)?.is_null() != *negated)
        }
    };

    Ok(truth)
}

fn eval_compare(ctx: &dyn EvalContext, cmp: &ComparePredicate) -> Result<Truth, QueryError> {
    let left = eval_expr(ctx, &cmp.left)?;
    let right = eval_expr(ctx, &cmp.right)?;

    Ok(compare(&left, cmp.op, &right))
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Truth {
    Truth::from_option(strict_order_cmp(left, right).map(|ordering| match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
    }))
}

fn arith(op: ArithOp, lhs: Value, rhs: Value) -> Result<Value, QueryError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        let result = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div if b == 0 => return Ok(Value::Null),
            ArithOp::Div => a.checked_div(b),
        };

        return result.map(Value::Int).ok_or_else(|| {
            InternalError::executor_unsupported(format!("integer overflow in {a} {op} {b}")).into()
        });
    }

    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::float(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        })),
        _ => Err(InternalError::executor_unsupported(format!(
            "cannot apply '{op}' to {} and {}",
            lhs.kind(),
            rhs.kind()
        ))
        .into()),
    }
}

fn eval_func(ctx: &dyn EvalContext, func: &FuncExpr) -> Result<Value, QueryError> {
    let text_of = |expr: &Expr| -> Result<Option<String>, QueryError> {
        Ok(eval_expr(ctx, expr)?.render())
    };

    let value = match func {
        FuncExpr::Coalesce(args) => {
            for arg in args {
                let value = eval_expr(ctx, arg)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Value::Null
        }
        FuncExpr::Concat(args) => {
            let mut out = String::new();
            for arg in args {
                match text_of(arg)? {
                    Some(text) => out.push_str(&text),
                    None => return Ok(Value::Null),
                }
            }
            Value::Text(out)
        }
        FuncExpr::Lower(arg) => text_of(arg)?.map(|text| text.to_lowercase()).into(),
        FuncExpr::Upper(arg) => text_of(arg)?.map(|text| text.to_uppercase()).into(),
        FuncExpr::StringValue(arg) => text_of(arg)?.into(),
        FuncExpr::Replace { expr, from, to } => {
            match (text_of(expr)?, text_of(from)?, text_of(to)?) {
                (Some(text), Some(from), Some(to)) => Value::Text(text.replace(&from, &to)),
                _ => Value::Null,
            }
        }
    };

    Ok(value)
}

fn text_matches(mode: LikeMode, pattern: &str, text: &str) -> bool {
    match mode {
        LikeMode::Pattern => like(pattern, text),
        LikeMode::Contains => text.contains(pattern),
        LikeMode::StartsWith => text.starts_with(pattern),
        LikeMode::EndsWith => text.ends_with(pattern),
    }
}

/// SQL `LIKE` over characters: `%` matches any run, `_` exactly one.
pub(crate) fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // matches[j]: pattern[..i] matches text[..j]
    let mut matches = vec![false; text.len() + 1];
    matches[0] = true;

    for &p in &pattern {
        let mut next = vec![false; text.len() + 1];
        if p == '%' {
            let mut seen = false;
            for j in 0..=text.len() {
                seen |= matches[j];
                next[j] = seen;
            }
        } else {
            for j in 1..=text.len() {
                next[j] = matches[j - 1] && (p == '_' || p == text[j - 1]);
            }
        }
        matches = next;
    }

    matches[text.len()]
}
