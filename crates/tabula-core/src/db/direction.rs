use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Direction
///
/// Sort direction of one order key.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

///
/// NullOrder
///
/// Placement of null sort keys, independent of the key's direction.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrder {
    #[default]
    First,
    Last,
}
