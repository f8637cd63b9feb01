use crate::{DEFAULT_MAX_GROUPS, DEFAULT_MAX_JOIN_ROWS, db::direction::NullOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("invalid executor config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("executor config field '{field}' must be greater than zero")]
    Zero { field: &'static str },
}

///
/// ExecutorConfig
///
/// Executor policy: default null placement for order keys without an
/// explicit one, plus hard limits on grouped and joined intermediate state.
/// Missing fields take their defaults; unknown fields are rejected.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    pub null_order: NullOrder,
    pub max_groups: u64,
    pub max_join_rows: u64,
}

impl ExecutorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_groups == 0 {
            return Err(ConfigError::Zero {
                field: "max_groups",
            });
        }
        if self.max_join_rows == 0 {
            return Err(ConfigError::Zero {
                field: "max_join_rows",
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_null_order(mut self, null_order: NullOrder) -> Self {
        self.null_order = null_order;
        self
    }

    #[must_use]
    pub const fn with_max_groups(mut self, max_groups: u64) -> Self {
        self.max_groups = max_groups;
        self
    }

    #[must_use]
    pub const fn with_max_join_rows(mut self, max_join_rows: u64) -> Self {
        self.max_join_rows = max_join_rows;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            null_order: NullOrder::First,
            max_groups: DEFAULT_MAX_GROUPS,
            max_join_rows: DEFAULT_MAX_JOIN_ROWS,
        }
    }
}
