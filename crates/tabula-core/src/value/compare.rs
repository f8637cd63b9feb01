use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used by ORDER BY, min/max and group emission.
///
/// Ordering rules:
/// 1. Numeric values (`Int`, `Float`) compare by magnitude across variants
/// 2. Otherwise by canonical variant rank
/// 3. Variant-specific comparison for same-ranked values
///
/// Mixed-variant comparisons are rank-only and must remain deterministic.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    if let Some(ordering) = numeric_cmp(left, right) {
        return ordering;
    }

    let rank = canonical_rank(left).cmp(&canonical_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => canonical_cmp_list(a, b),
        _ => Ordering::Equal,
    }
}

/// Strict comparator for predicates.
///
/// Returns `None` when either side is null or the variants are not
/// comparable; predicate evaluation reads that as "unknown".
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    if let Some(ordering) = numeric_cmp(left, right) {
        return Some(ordering);
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) => strict_cmp_list(a, b),
        _ => None,
    }
}

/// Strict equality for predicates; `None` under the same rules as
/// [`strict_order_cmp`].
#[must_use]
pub fn strict_eq(left: &Value, right: &Value) -> Option<bool> {
    strict_order_cmp(left, right).map(Ordering::is_eq)
}

const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::List(_) => 4,
    }
}

fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Float(b)) => Some(cmp_int_float(*a, b.get())),
        (Value::Float(a), Value::Int(b)) => Some(cmp_int_float(*b, a.get()).reverse()),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    (int as f64).total_cmp(&float)
}

fn canonical_cmp_list(left: &[Value], right: &[Value]) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = canonical_cmp(left, right);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}

fn strict_cmp_list(left: &[Value], right: &[Value]) -> Option<Ordering> {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = strict_order_cmp(left, right)?;
        if cmp != Ordering::Equal {
            return Some(cmp);
        }
    }

    Some(left.len().cmp(&right.len()))
}
