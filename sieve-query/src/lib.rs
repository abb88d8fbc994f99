//! # sieve-query
//!
//! Compiles declarative filter objects into query constraints.
//!
//! This crate provides:
//! - Filter declarations (`filter_spec!`, [`FilterSpec`]) binding struct fields to operators
//! - A compiler turning the set fields of a filter object into one AND-ed constraint
//! - Relation path resolution through joins (`account.owner.name`)
//! - Sort key rewriting for declared relation fields
//! - A bundled SQL backend rendering parameterized `SELECT` and `COUNT` statements
//!
//! ## Declaring Filters
//!
//! ```rust
//! use sieve_query::prelude::*;
//! use sieve_query::sql::SqlCriteria;
//!
//! #[derive(Default)]
//! struct PersonFilter {
//!     name: Option<String>,
//!     status: Option<String>,
//!     tipo_sexo: Option<String>,
//! }
//!
//! sieve_query::filter_spec!(PersonFilter {
//!     name => StartsWith,
//!     status => Equal @ "account.status",
//!     tipo_sexo as "tipoSexoDescricao" => Equal @ "tipoSexo.nome",
//! });
//!
//! let filter = PersonFilter {
//!     name: Some("Jo".into()),
//!     status: Some("ACTIVE".into()),
//!     ..Default::default()
//! };
//! let page = PageRequest::of(0, 20).with_sort([OrderByField::asc("tipoSexoDescricao")]);
//!
//! let mut criteria = SqlCriteria::new("people");
//! let compiled = SpecificationCompiler::default()
//!     .compile(&filter, &page, &mut criteria)
//!     .unwrap();
//! assert_eq!(compiled.page.sort()[0].column, "tipoSexo.nome");
//!
//! let query = criteria.finish(&compiled.constraint, &compiled.page).unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT t0.* FROM people t0 \
//!      LEFT JOIN account j1 ON t0.account_id = j1.id \
//!      LEFT JOIN tipoSexo j2 ON t0.tipoSexo_id = j2.id \
//!      WHERE (LOWER(t0.name) LIKE $1 AND j1.status = $2) \
//!      ORDER BY j2.nome ASC LIMIT 20"
//! );
//! ```
//!
//! ## Other Backends
//!
//! The compiler only talks to [`CriteriaBuilder`]. Implement it to target
//! another query representation; [`sql::SqlCriteria`] is one implementation.
//!
//! ## Error Handling
//!
//! ```rust
//! use sieve_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::not_a_collection("name");
//! assert_eq!(err.code, ErrorCode::NotACollection);
//! assert!(err.is_configuration_error());
//! ```

pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod filter;
pub mod logging;
#[macro_use]
pub mod macros;
pub mod pagination;
pub mod spec;
pub mod sql;
pub mod types;

pub use config::CompilerConfig;
pub use criteria::{CriteriaBuilder, JoinType};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use executor::SpecificationExecutor;
pub use filter::{Expr, Filter, FilterValue};
pub use pagination::{Page, PageRequest};
pub use spec::{
    Clock, Compiled, Declarations, FilterDeclaration, FilterInput, FilterSpec, ListValue, Operation,
    RangeValue, SpecificationCompiler, ToFilterInput, rewrite_sort,
};
pub use sql::{DatabaseType, SelectQuery, SqlCriteria};
pub use types::{NullsOrder, OrderByField, SortOrder};

#[doc(hidden)]
pub use tracing as __tracing;

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::CompilerConfig;
    pub use crate::criteria::{CriteriaBuilder, JoinType};
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::executor::SpecificationExecutor;
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::pagination::{Page, PageRequest};
    pub use crate::spec::{
        Compiled, Declarations, FilterDeclaration, FilterInput, FilterSpec, Operation, RangeValue,
        SpecificationCompiler, ToFilterInput,
    };
    pub use crate::types::{OrderByField, SortOrder};
    pub use crate::filter_spec;
}
