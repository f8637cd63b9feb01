use crate::{
    db::{
        executor::{
            aggregate::aggregate_values,
            eval::{EvalContext, eval_expr},
            scope::{JoinedRow, RowContext, Scope},
        },
        query::{AggregateExpr, ColumnRef, Expr, QueryError},
    },
    error::InternalError,
    value::Value,
};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

///
/// GroupKey
///
/// Grouping key: the evaluated group-by values plus a stable hash of their
/// canonical encoding. The hash only buckets; equality is exact value
/// equality, so `Int(1)` and `Float(1.0)` are different groups.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GroupKey {
    hash: u64,
    values: Vec<Value>,
}

impl GroupKey {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        let mut bytes = Vec::new();
        for value in &values {
            encode_value(value, &mut bytes);
        }

        Self {
            hash: xxh3_64(&bytes),
            values,
        }
    }

    pub(crate) const fn hash(&self) -> u64 {
        self.hash
    }
}

// Tagged, length-prefixed encoding; distinct values never share bytes.
fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(0),
        Value::Bool(v) => {
            out.push(1);
            out.push(u8::from(*v));
        }
        Value::Int(v) => {
            out.push(2);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Float(v) => {
            out.push(3);
            out.extend_from_slice(&v.get().to_bits().to_le_bytes());
        }
        Value::Text(v) => {
            out.push(4);
            out.extend_from_slice(&(v.len() as u64).to_le_bytes());
            out.extend_from_slice(v.as_bytes());
        }
        Value::List(items) => {
            out.push(5);
            out.extend_from_slice(&(items.len() as u64).to_le_bytes());
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

///
/// Group
///

#[derive(Debug)]
pub(crate) struct Group {
    pub(crate) key: GroupKey,
    pub(crate) rows: Vec<JoinedRow>,
}

/// Partition rows by the group-by keys, emitting groups in order of first
/// appearance. With no keys the whole input is one group, even when empty.
pub(crate) fn group_rows(
    scope: &Scope,
    rows: Vec<JoinedRow>,
    keys: &[Expr],
    max_groups: u64,
) -> Result<Vec<Group>, QueryError> {
    if keys.is_empty() {
        return Ok(vec![Group {
            key: GroupKey::new(Vec::new()),
            rows,
        }]);
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();

    for row in rows {
        let ctx = RowContext { scope, row: &row };
        let values = keys
            .iter()
            .map(|key| eval_expr(&ctx, key))
            .collect::<Result<Vec<_>, _>>()?;
        let key = GroupKey::new(values);

        let bucket = buckets.entry(key.hash()).or_default();
        if let Some(&index) = bucket.iter().find(|&&index| groups[index].key == key) {
            groups[index].rows.push(row);
            continue;
        }

        let attempted = groups.len() as u64 + 1;
        if attempted > max_groups {
            return Err(InternalError::executor_unsupported(format!(
                "grouped execution limit exceeded (groups): attempted={attempted}, limit={max_groups}"
            ))
            .into());
        }

        bucket.push(groups.len());
        groups.push(Group {
            key,
            rows: vec![row],
        });
    }

    Ok(groups)
}

///
/// GroupContext
///
/// Evaluation over one group. Bare columns read from the group's first
/// row, which validation restricts to group keys; aggregates fold over
/// every row of the group.
///

pub(crate) struct GroupContext<'a> {
    pub(crate) scope: &'a Scope,
    pub(crate) rows: &'a [JoinedRow],
}

impl EvalContext for GroupContext<'_> {
    fn column(&self, column: ColumnRef) -> Result<Value, QueryError> {
        match self.rows.first() {
            Some(row) => RowContext {
                scope: self.scope,
                row,
            }
            .column(column),
            None => Ok(Value::Null),
        }
    }

    fn aggregate(&self, aggregate: &AggregateExpr) -> Result<Value, QueryError> {
        let values = match &aggregate.arg {
            None => None,
            Some(arg) => Some(
                self.rows
                    .iter()
                    .map(|row| {
                        eval_expr(
                            &RowContext {
                                scope: self.scope,
                                row,
                            },
                            arg,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        aggregate_values(aggregate.kind, self.rows.len(), values)
    }
}
