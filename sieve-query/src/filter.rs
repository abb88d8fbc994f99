//! Constraint trees produced by the bundled SQL criteria backend.
//!
//! A [`Filter`] is a boolean expression over [`Expr`] operands. The compiler
//! never builds these directly; it goes through [`crate::criteria::CriteriaBuilder`],
//! and [`crate::sql::SqlCriteria`] answers with `Filter` nodes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sql::{DatabaseType, quote_identifier};

/// A filter value that can be used in comparisons.
///
/// Deserialization is untagged and tries `String` before `Date`, so JSON text
/// always stays text. Date filters read from request bodies should use typed
/// fields (`NaiveDate`, `Vec<NaiveDate>`) or [`crate::spec::RangeValue`],
/// which reads ISO dates itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Calendar date without a time zone.
    Date(NaiveDate),
    /// Absolute instant.
    DateTime(DateTime<Utc>),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }

    /// Whether values of this kind have a total order usable in range comparisons.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Float(_) | Self::String(_) | Self::Date(_) | Self::DateTime(_)
        )
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// An operand of a constraint: a column reached from the root or a join,
/// possibly wrapped in a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A column qualified by the alias of the table it belongs to.
    Column {
        /// Alias of the root table or join.
        qualifier: String,
        /// Column name.
        name: String,
    },
    /// `LOWER(expr)`.
    Lower(Box<Expr>),
    /// The expression read as an absolute instant.
    Instant(Box<Expr>),
    /// Cardinality of a collection-valued column.
    Size(Box<Expr>),
}

impl Expr {
    /// Create a qualified column reference.
    pub fn column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }

    /// Wrap in `LOWER`.
    pub fn lower(self) -> Self {
        Self::Lower(Box::new(self))
    }

    /// Read as an instant.
    pub fn instant(self) -> Self {
        Self::Instant(Box::new(self))
    }

    /// Take the cardinality.
    pub fn size(self) -> Self {
        Self::Size(Box::new(self))
    }

    /// Write the SQL for this expression.
    pub fn write_sql(&self, buf: &mut String, db: DatabaseType) {
        match self {
            Self::Column { qualifier, name } => {
                buf.push_str(qualifier);
                buf.push('.');
                buf.push_str(&quote_identifier(name, db));
            }
            Self::Lower(inner) => {
                buf.push_str("LOWER(");
                inner.write_sql(buf, db);
                buf.push(')');
            }
            Self::Instant(inner) => match db {
                DatabaseType::PostgreSQL => {
                    buf.push_str("CAST(");
                    inner.write_sql(buf, db);
                    buf.push_str(" AS TIMESTAMPTZ)");
                }
                DatabaseType::MySQL => {
                    buf.push_str("CAST(");
                    inner.write_sql(buf, db);
                    buf.push_str(" AS DATETIME)");
                }
                DatabaseType::SQLite => {
                    buf.push_str("datetime(");
                    inner.write_sql(buf, db);
                    buf.push(')');
                }
            },
            Self::Size(inner) => {
                buf.push_str(match db {
                    DatabaseType::PostgreSQL => "CARDINALITY(",
                    DatabaseType::MySQL => "JSON_LENGTH(",
                    DatabaseType::SQLite => "json_array_length(",
                });
                inner.write_sql(buf, db);
                buf.push(')');
            }
        }
    }

    /// Generate the SQL for this expression.
    pub fn to_sql(&self, db: DatabaseType) -> String {
        let mut buf = String::new();
        self.write_sql(&mut buf, db);
        buf
    }
}

/// A complete constraint that can be converted to SQL.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(Expr, FilterValue),
    /// Not equals comparison.
    NotEquals(Expr, FilterValue),

    /// Less than comparison.
    Lt(Expr, FilterValue),
    /// Less than or equal comparison.
    Lte(Expr, FilterValue),
    /// Greater than comparison.
    Gt(Expr, FilterValue),
    /// Greater than or equal comparison.
    Gte(Expr, FilterValue),

    /// In a list of values.
    In(Expr, Vec<FilterValue>),
    /// Pattern match with `%` wildcards.
    Like(Expr, String),
    /// Inclusive range `BETWEEN low AND high`.
    Between(Expr, FilterValue, FilterValue),

    /// Is null check.
    IsNull(Expr),
    /// Is not null check.
    IsNotNull(Expr),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create an AND filter. Empty filters are absorbed.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.pop().unwrap_or_default(),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    ///
    /// An OR containing an always-true branch is always true.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().collect();
        if filters.is_empty() || filters.iter().any(Filter::is_none) {
            return Self::None;
        }
        match filters.len() {
            1 => filters.pop().unwrap_or_default(),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Generate SQL for this filter with parameter placeholders.
    /// Returns (sql, params) where params are the values to bind.
    pub fn to_sql(&self, db: DatabaseType) -> (String, Vec<FilterValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_sql(&mut sql, &mut params, db);
        (sql, params)
    }

    /// Write SQL into `buf`, appending bound values to `params`.
    ///
    /// Placeholders are numbered after the values already in `params`.
    pub fn write_sql(&self, buf: &mut String, params: &mut Vec<FilterValue>, db: DatabaseType) {
        match self {
            Self::None => buf.push_str("TRUE"),

            Self::Equals(expr, val) if val.is_null() => {
                expr.write_sql(buf, db);
                buf.push_str(" IS NULL");
            }
            Self::NotEquals(expr, val) if val.is_null() => {
                expr.write_sql(buf, db);
                buf.push_str(" IS NOT NULL");
            }
            Self::Equals(expr, val) => write_comparison(buf, params, db, expr, "=", val),
            Self::NotEquals(expr, val) => write_comparison(buf, params, db, expr, "<>", val),
            Self::Lt(expr, val) => write_comparison(buf, params, db, expr, "<", val),
            Self::Lte(expr, val) => write_comparison(buf, params, db, expr, "<=", val),
            Self::Gt(expr, val) => write_comparison(buf, params, db, expr, ">", val),
            Self::Gte(expr, val) => write_comparison(buf, params, db, expr, ">=", val),

            Self::In(_, values) if values.is_empty() => buf.push_str("FALSE"),
            Self::In(expr, values) => {
                expr.write_sql(buf, db);
                buf.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    push_param(buf, params, db, value.clone());
                }
                buf.push(')');
            }
            Self::Like(expr, pattern) => {
                expr.write_sql(buf, db);
                buf.push_str(" LIKE ");
                push_param(buf, params, db, FilterValue::String(pattern.clone()));
            }
            Self::Between(expr, low, high) => {
                expr.write_sql(buf, db);
                buf.push_str(" BETWEEN ");
                push_param(buf, params, db, low.clone());
                buf.push_str(" AND ");
                push_param(buf, params, db, high.clone());
            }

            Self::IsNull(expr) => {
                expr.write_sql(buf, db);
                buf.push_str(" IS NULL");
            }
            Self::IsNotNull(expr) => {
                expr.write_sql(buf, db);
                buf.push_str(" IS NOT NULL");
            }

            Self::And(filters) => write_group(buf, params, db, filters, " AND ", "TRUE"),
            Self::Or(filters) => write_group(buf, params, db, filters, " OR ", "FALSE"),
            Self::Not(filter) => {
                buf.push_str("NOT (");
                filter.write_sql(buf, params, db);
                buf.push(')');
            }
        }
    }
}

fn push_param(buf: &mut String, params: &mut Vec<FilterValue>, db: DatabaseType, value: FilterValue) {
    params.push(value);
    buf.push_str(&db.placeholder(params.len()));
}

fn write_comparison(
    buf: &mut String,
    params: &mut Vec<FilterValue>,
    db: DatabaseType,
    expr: &Expr,
    op: &str,
    value: &FilterValue,
) {
    expr.write_sql(buf, db);
    buf.push(' ');
    buf.push_str(op);
    buf.push(' ');
    push_param(buf, params, db, value.clone());
}

fn write_group(
    buf: &mut String,
    params: &mut Vec<FilterValue>,
    db: DatabaseType,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    if filters.is_empty() {
        buf.push_str(empty);
        return;
    }
    buf.push('(');
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            buf.push_str(separator);
        }
        filter.write_sql(buf, params, db);
    }
    buf.push(')');
}
