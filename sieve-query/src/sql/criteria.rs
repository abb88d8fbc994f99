//! [`CriteriaBuilder`] implementation producing [`Filter`] trees.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::relation::RelationSpec;
use super::select::SelectQuery;
use super::DatabaseType;
use crate::config::CompilerConfig;
use crate::criteria::{CriteriaBuilder, JoinType};
use crate::error::{QueryError, QueryResult};
use crate::filter::{Expr, Filter, FilterValue};
use crate::pagination::PageRequest;

/// Alias of the root table in generated SQL.
pub const ROOT_ALIAS: &str = "t0";

/// A join recorded while resolving relation paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Join type.
    pub join_type: JoinType,
    /// Relation name of this segment.
    pub relation: String,
    /// Relation path from the root, e.g. `account.owner`.
    pub path: String,
    /// Alias of the table the relation belongs to.
    pub parent_alias: String,
    /// Alias of the joined table.
    pub alias: String,
    /// Joined table.
    pub table: String,
    /// Rendered `ON` condition.
    pub on: String,
}

/// Join handle handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlJoin {
    alias: String,
    path: String,
}

impl SqlJoin {
    /// Alias of the joined table.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Relation path from the root.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// SQL criteria for one query against `table`.
///
/// One instance serves exactly one compilation: joins accumulate as the
/// compiler resolves relation paths.
///
/// ```rust
/// use sieve_query::sql::SqlCriteria;
/// use sieve_query::CriteriaBuilder;
///
/// let mut criteria = SqlCriteria::new("people");
/// let status = criteria.root_attr("status").unwrap();
/// let predicate = criteria.equal(&status, "ACTIVE".into());
/// let (sql, params) = predicate.to_sql(criteria.database());
/// assert_eq!(sql, "t0.status = $1");
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SqlCriteria {
    table: String,
    db: DatabaseType,
    max_relation_depth: usize,
    joins: Vec<JoinClause>,
    relations: HashMap<String, RelationSpec>,
    collections: HashSet<String>,
}

impl SqlCriteria {
    /// Create criteria against a root table, using PostgreSQL syntax.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            db: DatabaseType::default(),
            max_relation_depth: CompilerConfig::default().max_relation_depth,
            joins: Vec::new(),
            relations: HashMap::new(),
            collections: HashSet::new(),
        }
    }

    /// Set the SQL dialect.
    pub fn with_database(mut self, db: DatabaseType) -> Self {
        self.db = db;
        self
    }

    /// Limit the joins a single sort key may add.
    ///
    /// Sort keys come from the caller, so dotted keys are held to the same
    /// depth as declared relation paths.
    pub fn with_max_relation_depth(mut self, depth: usize) -> Self {
        self.max_relation_depth = depth;
        self
    }

    /// Register how the relation at `path` (e.g. `account` or `account.owner`) is joined.
    pub fn with_relation(mut self, path: impl Into<String>, spec: RelationSpec) -> Self {
        self.relations.insert(path.into(), spec);
        self
    }

    /// Mark the attribute at `path` (e.g. `tags` or `account.roles`) as collection-valued.
    pub fn with_collection(mut self, path: impl Into<String>) -> Self {
        self.collections.insert(path.into());
        self
    }

    /// The root table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The SQL dialect.
    pub fn database(&self) -> DatabaseType {
        self.db
    }

    /// Joins recorded so far, in creation order.
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    fn add_join(
        &mut self,
        parent_alias: &str,
        parent_path: &str,
        relation: &str,
        join_type: JoinType,
    ) -> QueryResult<SqlJoin> {
        if relation.is_empty() {
            return Err(QueryError::invalid_relation_path(parent_path, "empty relation name"));
        }

        let path = if parent_path.is_empty() {
            relation.to_string()
        } else {
            format!("{}.{}", parent_path, relation)
        };
        let spec = self
            .relations
            .get(&path)
            .cloned()
            .unwrap_or_else(|| RelationSpec::conventional(relation));
        let alias = format!("j{}", self.joins.len() + 1);

        trace!(relation = %relation, path = %path, alias = %alias, "adding join");

        self.joins.push(JoinClause {
            join_type,
            relation: relation.to_string(),
            path: path.clone(),
            parent_alias: parent_alias.to_string(),
            alias: alias.clone(),
            table: spec.related_table.clone(),
            on: spec.on_condition(parent_alias, &alias, self.db),
        });

        Ok(SqlJoin { alias, path })
    }

    /// Relation path of the attribute behind a column expression.
    fn attribute_path(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Column { qualifier, name } if qualifier == ROOT_ALIAS => Some(name.clone()),
            Expr::Column { qualifier, name } => self
                .joins
                .iter()
                .find(|j| &j.alias == qualifier)
                .map(|j| format!("{}.{}", j.path, name)),
            _ => None,
        }
    }

    /// Resolve a sort key, reusing joins already created for the same relation chain.
    fn sort_expr(&mut self, column: &str) -> QueryResult<Expr> {
        let segments: Vec<&str> = column.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(QueryError::invalid_relation_path(column, "empty segment in sort key"));
        }
        let Some((leaf, relations)) = segments.split_last() else {
            return Err(QueryError::invalid_relation_path(column, "empty sort key"));
        };
        if relations.len() > self.max_relation_depth {
            return Err(QueryError::invalid_relation_path(
                column,
                format!(
                    "sort key needs {} joins, exceeding the maximum depth of {}",
                    relations.len(),
                    self.max_relation_depth
                ),
            ));
        }

        let mut alias = ROOT_ALIAS.to_string();
        let mut path = String::new();
        for relation in relations {
            let existing = self
                .joins
                .iter()
                .find(|j| j.parent_alias == alias && j.relation == *relation)
                .map(|j| SqlJoin {
                    alias: j.alias.clone(),
                    path: j.path.clone(),
                });
            let join = match existing {
                Some(join) => join,
                None => self.add_join(&alias, &path, relation, JoinType::Left)?,
            };
            alias = join.alias;
            path = join.path;
        }

        Ok(Expr::column(alias, *leaf))
    }

    /// Render the compiled constraint and page request into a select statement.
    ///
    /// Sort keys that are relation paths reuse the joins the constraint
    /// created, adding left joins only for relations not yet joined.
    pub fn finish(mut self, constraint: &Filter, page: &PageRequest) -> QueryResult<SelectQuery> {
        let filter_joins = self.joins.len();

        let mut order = Vec::with_capacity(page.sort().len());
        for field in page.sort() {
            let expr = self.sort_expr(&field.column)?;
            order.push((field.clone(), expr));
        }

        Ok(SelectQuery::build(
            &self.table,
            &self.joins,
            filter_joins,
            constraint,
            &order,
            page,
            self.db,
        ))
    }
}

impl CriteriaBuilder for SqlCriteria {
    type Attr = Expr;
    type Join = SqlJoin;
    type Predicate = Filter;

    fn root_attr(&mut self, name: &str) -> QueryResult<Expr> {
        if name.is_empty() {
            return Err(QueryError::invalid_relation_path(name, "empty attribute name"));
        }
        Ok(Expr::column(ROOT_ALIAS, name))
    }

    fn join_attr(&mut self, join: &SqlJoin, name: &str) -> QueryResult<Expr> {
        if name.is_empty() {
            return Err(QueryError::invalid_relation_path(&join.path, "empty attribute name"));
        }
        Ok(Expr::column(join.alias.clone(), name))
    }

    fn join_root(&mut self, relation: &str, join_type: JoinType) -> QueryResult<SqlJoin> {
        self.add_join(ROOT_ALIAS, "", relation, join_type)
    }

    fn join_from(&mut self, parent: &SqlJoin, relation: &str, join_type: JoinType) -> QueryResult<SqlJoin> {
        self.add_join(&parent.alias, &parent.path, relation, join_type)
    }

    fn lower(&self, attr: &Expr) -> Expr {
        attr.clone().lower()
    }

    fn as_instant(&self, attr: &Expr) -> Expr {
        attr.clone().instant()
    }

    fn size(&self, attr: &Expr) -> QueryResult<Expr> {
        match self.attribute_path(attr) {
            Some(path) if self.collections.contains(&path) => Ok(attr.clone().size()),
            Some(path) => Err(QueryError::not_a_collection(path)),
            None => Err(QueryError::not_a_collection(attr.to_sql(self.db))),
        }
    }

    fn equal(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::Equals(attr.clone(), value)
    }

    fn not_equal(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::NotEquals(attr.clone(), value)
    }

    fn greater_than(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::Gt(attr.clone(), value)
    }

    fn greater_or_equal(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::Gte(attr.clone(), value)
    }

    fn less_than(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::Lt(attr.clone(), value)
    }

    fn less_or_equal(&self, attr: &Expr, value: FilterValue) -> Filter {
        Filter::Lte(attr.clone(), value)
    }

    fn like(&self, attr: &Expr, pattern: String) -> Filter {
        Filter::Like(attr.clone(), pattern)
    }

    fn is_in(&self, attr: &Expr, values: Vec<FilterValue>) -> Filter {
        Filter::In(attr.clone(), values)
    }

    fn between(&self, attr: &Expr, low: FilterValue, high: FilterValue) -> Filter {
        Filter::Between(attr.clone(), low, high)
    }

    fn is_null(&self, attr: &Expr) -> Filter {
        Filter::IsNull(attr.clone())
    }

    fn is_not_null(&self, attr: &Expr) -> Filter {
        Filter::IsNotNull(attr.clone())
    }

    fn and(&self, predicates: Vec<Filter>) -> Filter {
        Filter::and(predicates)
    }

    fn or(&self, predicates: Vec<Filter>) -> Filter {
        Filter::or(predicates)
    }

    fn not(&self, predicate: Filter) -> Filter {
        Filter::not(predicate)
    }
}
