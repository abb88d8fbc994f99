//! The query-builder capability consumed by the compiler.
//!
//! A storage layer supplies an implementation of [`CriteriaBuilder`]; the
//! compiler only ever talks to this trait. It asks for attribute references on
//! the root entity or on joins, creates joins for relation paths, and builds
//! boolean predicates over the references it obtained.
//!
//! [`crate::sql::SqlCriteria`] is the bundled implementation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// How a relation join treats owning rows without a related row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Left outer join: owning rows without a match are kept.
    #[default]
    Left,
    /// Inner join: owning rows without a match are dropped.
    Inner,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Left => "LEFT JOIN",
            Self::Inner => "INNER JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Inner => "inner",
        })
    }
}

impl FromStr for JoinType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "left_outer" => Ok(Self::Left),
            "inner" => Ok(Self::Inner),
            other => Err(QueryError::invalid_configuration(format!(
                "Unknown join type '{}', expected 'left' or 'inner'",
                other
            ))),
        }
    }
}

/// Query-construction capability supplied by the storage layer.
///
/// Attribute references, joins and predicates are opaque to the compiler.
/// Joins and references may allocate state in the builder (aliases, join
/// clauses), hence `&mut self`; predicate construction is pure.
pub trait CriteriaBuilder {
    /// A resolved, queryable reference to a (possibly joined) attribute.
    type Attr: Clone + fmt::Debug;
    /// A join node created for a relation.
    type Join: Clone + fmt::Debug;
    /// A boolean constraint node.
    type Predicate: fmt::Debug;

    /// Reference an attribute of the root entity.
    fn root_attr(&mut self, name: &str) -> QueryResult<Self::Attr>;

    /// Reference an attribute of a joined entity.
    fn join_attr(&mut self, join: &Self::Join, name: &str) -> QueryResult<Self::Attr>;

    /// Join a relation of the root entity.
    fn join_root(&mut self, relation: &str, join_type: JoinType) -> QueryResult<Self::Join>;

    /// Join a relation of an already joined entity.
    fn join_from(
        &mut self,
        parent: &Self::Join,
        relation: &str,
        join_type: JoinType,
    ) -> QueryResult<Self::Join>;

    /// `LOWER(attr)`.
    fn lower(&self, attr: &Self::Attr) -> Self::Attr;

    /// Reinterpret the attribute as an absolute instant.
    fn as_instant(&self, attr: &Self::Attr) -> Self::Attr;

    /// Cardinality of a collection-valued attribute.
    ///
    /// Fails when the attribute is not a collection.
    fn size(&self, attr: &Self::Attr) -> QueryResult<Self::Attr>;

    /// `attr = value`
    fn equal(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr <> value`
    fn not_equal(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr > value`
    fn greater_than(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr >= value`
    fn greater_or_equal(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr < value`
    fn less_than(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr <= value`
    fn less_or_equal(&self, attr: &Self::Attr, value: FilterValue) -> Self::Predicate;
    /// `attr LIKE pattern`
    fn like(&self, attr: &Self::Attr, pattern: String) -> Self::Predicate;
    /// `attr IN (values)`
    fn is_in(&self, attr: &Self::Attr, values: Vec<FilterValue>) -> Self::Predicate;
    /// `attr BETWEEN low AND high`, inclusive.
    fn between(&self, attr: &Self::Attr, low: FilterValue, high: FilterValue) -> Self::Predicate;
    /// `attr IS NULL`
    fn is_null(&self, attr: &Self::Attr) -> Self::Predicate;
    /// `attr IS NOT NULL`
    fn is_not_null(&self, attr: &Self::Attr) -> Self::Predicate;

    /// Conjunction of predicates; empty means always true.
    fn and(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;
    /// Disjunction of predicates.
    fn or(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;
    /// Negation.
    fn not(&self, predicate: Self::Predicate) -> Self::Predicate;

    /// The universal predicate that matches every record.
    fn conjunction(&self) -> Self::Predicate {
        self.and(Vec::new())
    }
}
