use crate::db::query::predicate::Predicate;

// Null elision: dynamic queries build predicates from optional inputs. An
// absent operand contributes no constraint, and when every operand is absent
// the result is `Predicate::True` (match all).

/// `a AND b` with absent operands elided.
#[must_use]
pub fn and(left: Option<Predicate>, right: Option<Predicate>) -> Predicate {
    match (left, right) {
        (Some(left), Some(right)) => left.and(right),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => Predicate::True,
    }
}

/// `a OR b` with absent operands elided.
#[must_use]
pub fn or(left: Option<Predicate>, right: Option<Predicate>) -> Predicate {
    match (left, right) {
        (Some(left), Some(right)) => left.or(right),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => Predicate::True,
    }
}

///
/// OptionalPredicate
///
/// Chaining form of [`and`]/[`or`] for `Option<Predicate>`, used by
/// condition helpers that return `None` when their input is empty.
///

pub trait OptionalPredicate {
    #[must_use]
    fn and_opt(self, rhs: Option<Predicate>) -> Option<Predicate>;

    #[must_use]
    fn or_opt(self, rhs: Option<Predicate>) -> Option<Predicate>;
}

impl OptionalPredicate for Option<Predicate> {
    fn and_opt(self, rhs: Option<Predicate>) -> Option<Predicate> {
        match (self, rhs) {
            (None, None) => None,
            (left, right) => Some(and(left, right)),
        }
    }

    fn or_opt(self, rhs: Option<Predicate>) -> Option<Predicate> {
        match (self, rhs) {
            (None, None) => None,
            (left, right) => Some(or(left, right)),
        }
    }
}

///
/// ConditionBuilder
///
/// Mutable accumulator for dynamic conditions. Starts empty; `build`
/// yields `None` while nothing has been added so the caller can pass it
/// straight to `Query::filter_opt`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConditionBuilder {
    current: Option<Predicate>,
}

impl ConditionBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Seed the builder with an initial condition.
    #[must_use]
    pub const fn with(initial: Predicate) -> Self {
        Self {
            current: Some(initial),
        }
    }

    pub fn and(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        let current = self.current.take();
        self.current = current.and_opt(predicate.into());
        self
    }

    pub fn or(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        let current = self.current.take();
        self.current = current.or_opt(predicate.into());
        self
    }

    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Predicate> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn build(&self) -> Option<Predicate> {
        self.current.clone()
    }
}
