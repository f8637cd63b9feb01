use crate::db::query::PageSpec;
use std::ops::Range;

/// Index range kept by an offset/limit window over `len` ordered rows.
#[must_use]
pub(crate) fn compute_page_window(page: PageSpec, len: usize) -> Range<usize> {
    let start = usize::try_from(page.offset).unwrap_or(usize::MAX).min(len);
    let end = match page.limit {
        Some(limit) => start
            .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
            .min(len),
        None => len,
    };

    start..end
}

/// Keep only the rows inside the window.
pub(crate) fn apply_window<T>(rows: &mut Vec<T>, page: PageSpec) {
    let window = compute_page_window(page, rows.len());
    rows.truncate(window.end);
    rows.drain(..window.start);
}
