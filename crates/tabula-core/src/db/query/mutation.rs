use crate::{
    db::query::{
        QueryError,
        expr::Expr,
        field::{Column, ColumnRef, Source},
        plan_validate::{PlanError, validate_single_source, validate_single_source_expr},
        predicate::Predicate,
    },
    value::FieldValue,
};

///
/// Assignment
/// `column = value`, where `value` may reference the row's current columns.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assignment {
    pub column: ColumnRef,
    pub value: Expr,
}

///
/// Update
///
/// Bulk update builder. Rows matching the filter (all rows when no filter
/// is set) receive every assignment, evaluated against the row as it was
/// before the update.
///

#[derive(Clone, Debug)]
pub struct Update {
    target: Source,
    assignments: Vec<Assignment>,
    filter: Option<Predicate>,
}

impl Update {
    #[must_use]
    pub const fn table(target: Source) -> Self {
        Self {
            target,
            assignments: Vec::new(),
            filter: None,
        }
    }

    /// Assign a literal.
    #[must_use]
    pub fn set<T: FieldValue>(self, column: Column<T>, value: impl Into<T>) -> Self {
        let value = Expr::Literal(value.into().to_value());
        self.set_expr(column, value)
    }

    /// Assign the null value.
    #[must_use]
    pub fn set_null<T: FieldValue>(self, column: Column<T>) -> Self {
        self.set_expr(column, Expr::null())
    }

    /// Assign a computed value, e.g. `member.age.add(1)`.
    #[must_use]
    pub fn set_expr<T: FieldValue>(mut self, column: Column<T>, value: impl Into<Expr>) -> Self {
        self.assignments.push(Assignment {
            column: column.column_ref(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    #[must_use]
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    pub fn build(self) -> Result<UpdateSpec, QueryError> {
        if self.assignments.is_empty() {
            return Err(PlanError::EmptyAssignment.into());
        }

        for assignment in &self.assignments {
            validate_single_source_expr(self.target, &Expr::Column(assignment.column), "set")?;
            validate_single_source_expr(self.target, &assignment.value, "set")?;
        }

        let filter = self.filter.unwrap_or(Predicate::True);
        validate_single_source(self.target, &filter, "where")?;

        Ok(UpdateSpec {
            target: self.target,
            assignments: self.assignments,
            filter,
        })
    }
}

///
/// UpdateSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateSpec {
    pub(crate) target: Source,
    pub(crate) assignments: Vec<Assignment>,
    pub(crate) filter: Predicate,
}

impl UpdateSpec {
    #[must_use]
    pub const fn target(&self) -> Source {
        self.target
    }

    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    #[must_use]
    pub const fn filter(&self) -> &Predicate {
        &self.filter
    }
}

///
/// Delete
/// Bulk delete builder; no filter deletes every row.
///

#[derive(Clone, Debug)]
pub struct Delete {
    target: Source,
    filter: Option<Predicate>,
}

impl Delete {
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub const fn from(target: Source) -> Self {
        Self {
            target,
            filter: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn build(self) -> Result<DeleteSpec, QueryError> {
        let filter = self.filter.unwrap_or(Predicate::True);
        validate_single_source(self.target, &filter, "where")?;

        Ok(DeleteSpec {
            target: self.target,
            filter,
        })
    }
}

///
/// DeleteSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteSpec {
    pub(crate) target: Source,
    pub(crate) filter: Predicate,
}

impl DeleteSpec {
    #[must_use]
    pub const fn target(&self) -> Source {
        self.target
    }

    #[must_use]
    pub const fn filter(&self) -> &Predicate {
        &self.filter
    }
}
