use crate::{
    db::direction::{Direction, NullOrder},
    value::{Value, canonical_cmp},
};
use std::cmp::Ordering;

///
/// OrderKey
/// Resolved direction and null placement for one sort key.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct OrderKey {
    pub(crate) direction: Direction,
    pub(crate) nulls: NullOrder,
}

/// Compare two key tuples. Null placement does not flip with direction.
pub(crate) fn compare_keys(keys: &[OrderKey], left: &[Value], right: &[Value]) -> Ordering {
    for ((key, left), right) in keys.iter().zip(left).zip(right) {
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match key.nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (false, true) => match key.nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (false, false) => match key.direction {
                Direction::Asc => canonical_cmp(left, right),
                Direction::Desc => canonical_cmp(left, right).reverse(),
            },
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Stable sort by precomputed keys; ties keep input order.
pub(crate) fn sort_by_keys<T>(rows: &mut [(T, Vec<Value>)], keys: &[OrderKey]) {
    if keys.is_empty() {
        return;
    }

    rows.sort_by(|(_, left), (_, right)| compare_keys(keys, left, right));
}
