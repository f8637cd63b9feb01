//! ## Crate layout
//! - `core`: runtime values, schema descriptors, the query builder, the
//!   executor, the in-memory store and observability.
//! - `error`: the public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the query vocabulary used by application
//! code; stores, sinks and executor configuration are imported from `core`.

pub use tabula_core as core;

pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        core::{
            config::ExecutorConfig,
            db::query::{Bean, FromTuple, ProjectionArgs},
            prelude::*,
        },
    };
    pub use serde::{Deserialize, Serialize};
}
