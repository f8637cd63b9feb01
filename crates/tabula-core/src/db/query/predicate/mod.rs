mod ast;
mod compose;

#[cfg(test)]
mod tests;

pub use ast::{CompareOp, ComparePredicate, InList, LikeMode, Predicate};
pub use compose::{ConditionBuilder, OptionalPredicate, and, or};
