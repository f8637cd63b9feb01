//! Query construction, execution and the row-source boundary.

pub mod direction;
pub mod executor;
pub mod query;
pub mod response;
pub mod row;
pub mod session;
pub mod source;
pub mod store;

// re-exports
pub use session::Session;
pub use source::{BulkMutation, RowSource};
