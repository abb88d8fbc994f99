//! Bundled SQL backend for the criteria capability.
//!
//! [`SqlCriteria`] implements [`crate::criteria::CriteriaBuilder`] by building
//! [`crate::filter::Filter`] trees and recording the joins the compiler asks
//! for. [`SqlCriteria::finish`] turns a compiled constraint and page request
//! into a parameterized [`SelectQuery`].

mod criteria;
mod relation;
mod select;

pub use criteria::{JoinClause, ROOT_ALIAS, SqlCriteria, SqlJoin};
pub use relation::{RelationSpec, RelationType};
pub use select::SelectQuery;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Escape a string for use in SQL (for identifiers, not values).
pub fn escape_identifier(name: &str, db: DatabaseType) -> String {
    let quote = db.identifier_quote();
    let escaped = name.replace(quote, &format!("{}{}", quote, quote));
    format!("{}{}{}", quote, escaped, quote)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    let reserved = [
        "user", "order", "group", "select", "from", "where", "table", "index", "key", "primary",
        "foreign", "check", "default", "null", "not", "and", "or", "in", "is", "like", "between",
        "case", "when", "then", "else", "end", "as", "on", "join", "left", "right", "inner",
        "outer", "cross", "natural", "using", "limit", "offset", "union", "intersect", "except",
        "all", "distinct", "having", "create", "alter", "drop", "insert", "update", "delete",
        "into", "values", "set", "returning",
    ];

    if reserved.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier if needed.
pub fn quote_identifier(name: &str, db: DatabaseType) -> String {
    if needs_quoting(name) {
        escape_identifier(name, db)
    } else {
        name.to_string()
    }
}

/// SQL dialect, which decides placeholders and a few function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// Character wrapping quoted identifiers.
    ///
    /// MySQL reads double quotes as string literals outside `ANSI_QUOTES` mode.
    pub fn identifier_quote(&self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite => '"',
        }
    }
}

impl FromStr for DatabaseType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            other => Err(QueryError::invalid_configuration(format!(
                "Unknown database type '{}'",
                other
            ))),
        }
    }
}
