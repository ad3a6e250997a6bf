//! Compiler configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Suffix appended to a table source's origin to name its state store.
    pub state_store_suffix: String,

    /// Plans nested deeper than this are rejected instead of recursed into.
    pub max_plan_depth: usize,

    /// Reference runner only: cap on rows rendered by console sinks.
    pub console_row_limit: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            state_store_suffix: "_store".to_string(),
            max_plan_depth: 256,
            console_row_limit: None,
        }
    }
}

impl CompilerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `STREAMC_STATE_STORE_SUFFIX`: state store name suffix for table sources
    /// - `STREAMC_MAX_PLAN_DEPTH`: maximum plan nesting depth
    /// - `STREAMC_CONSOLE_ROW_LIMIT`: max rows printed by console sinks
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("STREAMC_STATE_STORE_SUFFIX") {
            cfg.state_store_suffix = s;
        }

        if let Ok(s) = std::env::var("STREAMC_MAX_PLAN_DEPTH") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_plan_depth = v;
            }
        }

        if let Ok(s) = std::env::var("STREAMC_CONSOLE_ROW_LIMIT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.console_row_limit = Some(v);
            }
        }

        cfg
    }

    /// Reject values the compiler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_plan_depth == 0 {
            return Err(Error::Config("max_plan_depth must be at least 1".into()));
        }
        if self.state_store_suffix.is_empty() {
            return Err(Error::Config("state_store_suffix must not be empty".into()));
        }
        Ok(())
    }

    /// State store name for a table source reading `origin`.
    pub fn state_store_name(&self, origin: &str) -> String {
        format!("{}{}", origin, self.state_store_suffix)
    }
}
