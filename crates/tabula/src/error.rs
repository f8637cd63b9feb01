use derive_more::Display;
use serde::{Deserialize, Serialize};
use tabula_core::{
    config::ConfigError,
    db::{
        query::{PlanError, QueryError},
        response::ResponseError,
    },
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    value::ValueConversionError,
};
use thiserror::Error as ThisError;


///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    fn query(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Query(kind), ErrorOrigin::Query, message)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match (err.origin, err.class) {
            (CoreErrorOrigin::Store, ErrorClass::Conflict) => {
                ErrorKind::Store(StoreErrorKind::Conflict)
            }
            (_, ErrorClass::NotFound) => ErrorKind::Store(StoreErrorKind::NotFound),
            (CoreErrorOrigin::Store, ErrorClass::Unsupported) => {
                ErrorKind::Store(StoreErrorKind::Rejected)
            }
            (_, ErrorClass::Unsupported) => ErrorKind::Query(QueryErrorKind::LimitExceeded),
            _ => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<PlanError> for Error {
    fn from(err: PlanError) -> Self {
        let kind = match &err {
            PlanError::AggregateInFilter { .. } => QueryErrorKind::AggregateInFilter,
            PlanError::AmbiguousGroupKey { .. } => QueryErrorKind::AmbiguousGroupKey,
            PlanError::DuplicateAlias { .. } => QueryErrorKind::DuplicateAlias,
            PlanError::InvalidRange { .. } => QueryErrorKind::InvalidRange,
            PlanError::MissingSource => QueryErrorKind::MissingSource,
            PlanError::NestedAggregate { .. } => QueryErrorKind::NestedAggregate,
            PlanError::SubqueryColumns { .. } => QueryErrorKind::SubqueryShape,
            PlanError::UnresolvedColumn { .. } => QueryErrorKind::UnresolvedColumn,
            PlanError::DanglingJoinModifier { .. }
            | PlanError::EmptyAssignment
            | PlanError::MissingSelect => QueryErrorKind::Invalid,
        };

        Self::query(kind, err.to_string())
    }
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        let kind = match err {
            ResponseError::NotFound { .. } => QueryErrorKind::NotFound,
            ResponseError::NotUnique { .. } => QueryErrorKind::NonUniqueResult,
        };

        Self::new(ErrorKind::Query(kind), ErrorOrigin::Response, err.to_string())
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Execute(err) => err.into(),
            QueryError::Plan(err) => err.into(),
            QueryError::Response(err) => err.into(),

            QueryError::Projection(_) => {
                Self::query(QueryErrorKind::ProjectionArity, err.to_string())
            }

            QueryError::SubqueryShape { .. } => {
                Self::query(QueryErrorKind::SubqueryShape, err.to_string())
            }
        }
    }
}

impl From<ValueConversionError> for Error {
    fn from(err: ValueConversionError) -> Self {
        Self::query(QueryErrorKind::ProjectionArity, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Query(QueryErrorKind),
    Store(StoreErrorKind),

    /// Executor configuration failed to parse or validate.
    Config,

    /// The caller cannot remediate this.
    Internal,
}

///
/// QueryErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum QueryErrorKind {
    /// Aggregate used in where, join or group-by position.
    AggregateInFilter,

    /// Bare column neither grouped nor aggregated.
    AmbiguousGroupKey,

    DuplicateAlias,

    /// Query shape is invalid (missing select, empty update, misplaced modifier).
    Invalid,

    /// Negative offset or limit.
    InvalidRange,

    /// Group or join budget exceeded.
    LimitExceeded,

    MissingSource,
    NestedAggregate,

    /// `fetch_one` matched more than one row.
    NonUniqueResult,

    /// Valid query, but no rows matched where one was required.
    NotFound,

    /// Projection target does not fit the select list.
    ProjectionArity,

    /// Subquery has the wrong number of columns or rows.
    SubqueryShape,

    UnresolvedColumn,
}

///
/// StoreErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum StoreErrorKind {
    /// Duplicate primary key.
    Conflict,

    /// Unregistered source.
    NotFound,

    /// Row or mutation violates the source model.
    Rejected,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorOrigin {
    Config,
    Executor,
    Query,
    Response,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Response => Self::Response,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
