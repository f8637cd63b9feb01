use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Errors related to interpreting a materialized response.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ResponseError {
    #[error("expected exactly one row, found 0 (table {table})")]
    NotFound { table: &'static str },

    #[error("expected at most one row, found {count} (table {table})")]
    NotUnique { table: &'static str, count: u64 },
}

///
/// Response
/// Materialized, ordered query results.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response<T> {
    source: &'static str,
    rows: Vec<T>,
}

impl<T> Response<T> {
    pub(crate) const fn new(source: &'static str, rows: Vec<T>) -> Self {
        Self { source, rows }
    }

    //
    // Cardinality
    //

    #[must_use]
    pub fn count(&self) -> u64 {
        self.rows.len() as u64
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    //
    // Exact cardinality helpers
    //

    /// Require exactly one row.
    pub fn one(self) -> Result<T, ResponseError> {
        let source = self.source;
        self.one_opt()?
            .ok_or(ResponseError::NotFound { table: source })
    }

    /// Require at most one row.
    pub fn one_opt(self) -> Result<Option<T>, ResponseError> {
        let count = self.count();
        if count > 1 {
            return Err(ResponseError::NotUnique {
                table: self.source,
                count,
            });
        }

        Ok(self.rows.into_iter().next())
    }

    /// First row, if any.
    #[must_use]
    pub fn first(self) -> Option<T> {
        self.rows.into_iter().next()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

impl<T> IntoIterator for Response<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

///
/// QueryResults
///
/// One page of results plus the total row count of the same query without
/// its window.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryResults<T> {
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: u64,
    pub results: Vec<T>,
}

impl<T> QueryResults<T> {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

///
/// PageRequest
/// Zero-based page number and page size.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    #[must_use]
    pub const fn of(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

///
/// Page
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub request: PageRequest,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn from_results(results: QueryResults<T>, request: PageRequest) -> Self {
        Self {
            content: results.results,
            request,
            total: results.total,
        }
    }

    /// Build a page, running `count` only when the content alone cannot
    /// prove the total. A short first page or a short non-empty later page
    /// proves it; a zero-size page never does.
    pub fn with_lazy_count<E>(
        content: Vec<T>,
        request: PageRequest,
        count: impl FnOnce() -> Result<u64, E>,
    ) -> Result<Self, E> {
        let len = content.len() as u64;
        let short = request.size > 0 && len < request.size;

        let total = if short && (request.offset() == 0 || len > 0) {
            request.offset() + len
        } else {
            count()?
        };

        Ok(Self {
            content,
            request,
            total,
        })
    }

    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.request.size == 0 {
            return 1;
        }

        self.total.div_ceil(self.request.size)
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.request.page.saturating_add(1) < self.total_pages()
    }
}
