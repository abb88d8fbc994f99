//! Compiler configuration.
//!
//! ```rust
//! use sieve_query::{CompilerConfig, JoinType};
//!
//! let config = CompilerConfig::default();
//! assert_eq!(config.join_type, JoinType::Left);
//! assert_eq!(config.max_relation_depth, 8);
//! ```
//!
//! # Environment Variables
//!
//! - `SIEVE_JOIN_TYPE=left|inner`
//! - `SIEVE_MAX_RELATION_DEPTH=<n>`
//! - `SIEVE_MAX_LIST_LEN=<n>`

use std::env;

use serde::{Deserialize, Serialize};

use crate::criteria::JoinType;
use crate::error::{QueryError, QueryResult};

/// Settings shared by every compilation of a [`crate::SpecificationCompiler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Join type used for every intermediate relation segment.
    pub join_type: JoinType,
    /// Maximum number of joins a single relation path may materialize.
    pub max_relation_depth: usize,
    /// Maximum number of values accepted by IN / NOT_IN.
    pub max_list_len: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            join_type: JoinType::Left,
            max_relation_depth: 8,
            max_list_len: 1000,
        }
    }
}

impl CompilerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the join type.
    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// Set the maximum relation depth.
    pub fn max_relation_depth(mut self, depth: usize) -> Self {
        self.max_relation_depth = depth;
        self
    }

    /// Set the maximum IN list length.
    pub fn max_list_len(mut self, len: usize) -> Self {
        self.max_list_len = len;
        self
    }

    /// Read overrides from `SIEVE_*` environment variables.
    pub fn from_env() -> QueryResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read overrides through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> QueryResult<Self> {
        let mut config = Self::default();

        if let Some(join_type) = lookup("SIEVE_JOIN_TYPE") {
            config.join_type = join_type.parse()?;
        }
        if let Some(depth) = lookup("SIEVE_MAX_RELATION_DEPTH") {
            config.max_relation_depth = parse_positive("SIEVE_MAX_RELATION_DEPTH", &depth)?;
        }
        if let Some(len) = lookup("SIEVE_MAX_LIST_LEN") {
            config.max_list_len = parse_positive("SIEVE_MAX_LIST_LEN", &len)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that limits are usable.
    pub fn validate(&self) -> QueryResult<()> {
        if self.max_relation_depth == 0 {
            return Err(QueryError::invalid_configuration(
                "max_relation_depth must be at least 1",
            ));
        }
        if self.max_list_len == 0 {
            return Err(QueryError::invalid_configuration("max_list_len must be at least 1"));
        }
        Ok(())
    }
}

fn parse_positive(key: &str, raw: &str) -> QueryResult<usize> {
    raw.trim().parse::<usize>().map_err(|e| {
        QueryError::invalid_configuration(format!("{} must be a positive integer, got '{}'", key, raw))
            .with_source(e)
    })
}
