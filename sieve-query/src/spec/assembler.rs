//! Assembling a filter object into one constraint.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::declaration::{Declarations, FilterSpec};
use super::registry::{self, BuildContext};
use super::{path, scanner};
use crate::config::CompilerConfig;
use crate::criteria::CriteriaBuilder;
use crate::error::QueryResult;
use crate::pagination::PageRequest;

/// Source of "now" for relative day windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// The system UTC clock.
    #[default]
    System,
    /// A fixed instant.
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// The current instant.
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(instant) => *instant,
        }
    }
}

/// A compiled constraint plus the page request with rewritten sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled<P> {
    /// The AND of every active field's predicate.
    pub constraint: P,
    /// The page request to run the constraint with.
    pub page: PageRequest,
}

/// Compiles declared filter objects against a [`CriteriaBuilder`].
///
/// The compiler holds no per-query state and can be shared between threads.
/// Each compilation gets its own builder.
///
/// ```rust
/// use sieve_query::prelude::*;
/// use sieve_query::sql::SqlCriteria;
///
/// #[derive(Default)]
/// struct PersonFilter {
///     name: Option<String>,
///     status: Option<String>,
/// }
///
/// sieve_query::filter_spec!(PersonFilter {
///     name => StartsWith,
///     status => Equal @ "account.status",
/// });
///
/// let filter = PersonFilter { name: Some("Jo".into()), status: Some("ACTIVE".into()) };
/// let mut criteria = SqlCriteria::new("people");
/// let compiled = SpecificationCompiler::default()
///     .compile(&filter, &PageRequest::of(0, 20), &mut criteria)
///     .unwrap();
///
/// let (sql, _) = compiled.constraint.to_sql(criteria.database());
/// assert_eq!(sql, "(LOWER(t0.name) LIKE $1 AND j1.status = $2)");
/// assert_eq!(criteria.joins().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpecificationCompiler {
    config: CompilerConfig,
    clock: Clock,
}

impl SpecificationCompiler {
    /// Create a compiler with a validated configuration.
    pub fn new(config: CompilerConfig) -> QueryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Clock::default(),
        })
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// The clock.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Compile `filter` into a constraint and rewrite the sort keys of `page`.
    pub fn compile<F, B>(
        &self,
        filter: &F,
        page: &PageRequest,
        builder: &mut B,
    ) -> QueryResult<Compiled<B::Predicate>>
    where
        F: FilterSpec,
        B: CriteriaBuilder,
    {
        let declarations = scanner::scan::<F>();
        let constraint = self.assemble(filter, &declarations, builder)?;
        Ok(Compiled {
            constraint,
            page: rewrite_sort(page, &declarations),
        })
    }

    /// Compile `filter` into a constraint only.
    pub fn constraint<F, B>(&self, filter: &F, builder: &mut B) -> QueryResult<B::Predicate>
    where
        F: FilterSpec,
        B: CriteriaBuilder,
    {
        self.assemble(filter, &scanner::scan::<F>(), builder)
    }

    fn assemble<F, B>(
        &self,
        filter: &F,
        declarations: &Declarations<F>,
        builder: &mut B,
    ) -> QueryResult<B::Predicate>
    where
        F: FilterSpec,
        B: CriteriaBuilder,
    {
        let filter_name = std::any::type_name::<F>();
        let active = scanner::active_fields(filter, declarations).map_err(|e| e.with_filter(filter_name))?;
        let ctx = BuildContext {
            now: self.clock.now(),
            max_list_len: self.config.max_list_len,
        };

        let mut predicates = Vec::with_capacity(active.len());
        for (declaration, input) in active {
            let field = declaration.field.as_ref();
            let attr = if declaration.has_relation() {
                path::resolve(
                    builder,
                    &declaration.relation_path,
                    self.config.join_type,
                    self.config.max_relation_depth,
                )
            } else {
                builder.root_attr(field)
            };
            let predicate = attr
                .and_then(|attr| registry::build(&*builder, declaration.operation, &attr, input, &ctx))
                .map_err(|e| {
                    e.with_field(field)
                        .with_filter(filter_name)
                        .with_operation(declaration.operation.as_str())
                })?;

            crate::sieve_debug!(
                filter = filter_name,
                field = field,
                operation = %declaration.operation,
                relation = %declaration.relation_path,
                "compiled filter field"
            );
            predicates.push(predicate);
        }

        debug!(filter = filter_name, predicates = predicates.len(), "assembled constraint");
        if predicates.is_empty() {
            Ok(builder.conjunction())
        } else {
            Ok(builder.and(predicates))
        }
    }
}

/// Replace sort keys that name a declared relation field by its relation path.
///
/// Keys without a matching declaration, or whose declaration has no
/// relation path, are kept as they are.
pub fn rewrite_sort<F>(page: &PageRequest, declarations: &Declarations<F>) -> PageRequest {
    page.with_sort(page.sort().iter().map(|field| {
        match declarations.get(&field.column) {
            Some(declaration) if declaration.has_relation() => {
                field.with_column(declaration.relation_path.clone())
            }
            _ => field.clone(),
        }
    }))
}
