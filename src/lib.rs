//! # Sieve
//!
//! Declarative filter specifications for paged, relation-aware queries.
//!
//! Sieve provides:
//! - Filter structs whose fields declare an operator and an optional relation path
//! - A compiler combining the set fields into one constraint, joining relations as needed
//! - Sort keys rewritten to the relation paths of declared fields
//! - A bundled SQL backend and an async execution seam for storage crates
//!
//! ## Quick Start
//!
//! ```rust
//! use sieve::prelude::*;
//! use sieve::sql::SqlCriteria;
//!
//! #[derive(Default)]
//! struct OrderFilter {
//!     reference: Option<String>,
//!     customer: Option<String>,
//!     placed: Option<Vec<chrono::NaiveDate>>,
//! }
//!
//! sieve::filter_spec!(OrderFilter {
//!     reference => StartsWith,
//!     customer => Like @ "customer.name",
//!     placed => Between,
//! });
//!
//! let filter = OrderFilter {
//!     customer: Some("Acme".into()),
//!     ..Default::default()
//! };
//!
//! let mut criteria = SqlCriteria::new("orders");
//! let compiled = SpecificationCompiler::default()
//!     .compile(&filter, &PageRequest::of(0, 50), &mut criteria)
//!     .unwrap();
//! let query = criteria.finish(&compiled.constraint, &compiled.page).unwrap();
//!
//! assert_eq!(
//!     query.sql,
//!     "SELECT t0.* FROM orders t0 LEFT JOIN customer j1 ON t0.customer_id = j1.id \
//!      WHERE LOWER(j1.name) LIKE $1 LIMIT 50"
//! );
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filter declarations and the specification compiler.
pub mod spec {
    pub use sieve_query::spec::*;
}

/// The bundled SQL backend.
pub mod sql {
    pub use sieve_query::sql::*;
}

/// Logging setup.
pub mod logging {
    pub use sieve_query::logging::*;
}

// Re-export macros
pub use sieve_query::{filter_spec, query_error, sieve_debug};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sieve_query::prelude::*;
}

// Re-export key types at the crate root
pub use sieve_query::{
    CompilerConfig, CriteriaBuilder, ErrorCode, Expr, Filter, FilterValue, JoinType, NullsOrder,
    OrderByField, Page, PageRequest, QueryError, QueryResult, SortOrder, SpecificationCompiler,
    SpecificationExecutor,
};
