use crate::{
    db::query::{AggregateKind, QueryError},
    error::InternalError,
    value::{Value, canonical_cmp},
};

/// Fold one aggregate. `values` is `None` for `count(*)`, which counts
/// `rows`; every other form ignores nulls and yields null over no input,
/// except `count`, which yields zero.
pub(crate) fn aggregate_values(
    kind: AggregateKind,
    rows: usize,
    values: Option<Vec<Value>>,
) -> Result<Value, QueryError> {
    let Some(values) = values else {
        return Ok(Value::Int(count_to_int(rows)));
    };
    let present: Vec<Value> = values.into_iter().filter(|value| !value.is_null()).collect();

    match kind {
        AggregateKind::Count => Ok(Value::Int(count_to_int(present.len()))),
        AggregateKind::Sum => sum(&present),
        AggregateKind::Avg => avg(&present),
        AggregateKind::Min => Ok(present
            .into_iter()
            .min_by(canonical_cmp)
            .unwrap_or(Value::Null)),
        AggregateKind::Max => Ok(present
            .into_iter()
            .max_by(canonical_cmp)
            .unwrap_or(Value::Null)),
    }
}

fn count_to_int(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

// Integer sums stay integers; any float widens the whole sum.
fn sum(values: &[Value]) -> Result<Value, QueryError> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    if values.iter().all(|value| matches!(value, Value::Int(_))) {
        let mut total: i64 = 0;
        for value in values {
            let Value::Int(v) = value else { continue };
            total = total.checked_add(*v).ok_or_else(|| {
                InternalError::executor_unsupported("integer overflow in sum()")
            })?;
        }
        return Ok(Value::Int(total));
    }

    Ok(Value::float(numeric(values, "sum")?.iter().sum()))
}

#[allow(clippy::cast_precision_loss)]
fn avg(values: &[Value]) -> Result<Value, QueryError> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    let numbers = numeric(values, "avg")?;
    let total: f64 = numbers.iter().sum();

    Ok(Value::float(total / numbers.len() as f64))
}

fn numeric(values: &[Value], function: &str) -> Result<Vec<f64>, QueryError> {
    values
        .iter()
        .map(|value| {
            value.as_f64().ok_or_else(|| {
                InternalError::executor_unsupported(format!(
                    "{function}() over non-numeric value of kind {}",
                    value.kind()
                ))
                .into()
            })
        })
        .collect()
}
