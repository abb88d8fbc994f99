//! Filter declarations and their static registration.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::FilterInput;
use crate::error::{ErrorCode, QueryError, QueryResult};

/// Supported filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// `x = v`
    Equal,
    /// `x <> v`
    NotEqual,
    /// Case-insensitive containment.
    Like,
    /// Negated case-insensitive containment.
    NotLike,
    /// Case-insensitive prefix.
    StartsWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// `x > v`
    GreaterThan,
    /// `x >= v`
    GreaterOrEqual,
    /// `x < v`
    LessThan,
    /// `x <= v`
    LessOrEqual,
    /// Membership.
    In,
    /// Negated membership.
    NotIn,
    /// `start <= x <= end`
    Between,
    /// `NOT (start <= x <= end)`
    NotBetween,
    /// `start < x < end`
    BetweenExclusive,
    /// `x < min OR x > max`
    OutsideRange,
    /// Same UTC calendar day.
    OnDate,
    /// Within the last N days.
    InLastDays,
    /// Within the next N days.
    InNextDays,
    /// Collection size equals N.
    SizeEq,
    /// Collection size greater than N.
    SizeGt,
    /// Collection size less than N.
    SizeLt,
    /// `x = true`
    ///
    /// Only the presence of a value matters: `Some(false)` still emits `x = true`.
    IsTrue,
    /// `x = false`
    ///
    /// Only the presence of a value matters: `Some(false)` still emits `x = false`.
    IsFalse,
    /// `x IS NULL` when the flag is set.
    IsNull,
    /// `x IS NOT NULL` when the flag is set.
    IsNotNull,
}

impl Operation {
    /// Every operator, in declaration order.
    pub const ALL: [Operation; 26] = [
        Self::Equal,
        Self::NotEqual,
        Self::Like,
        Self::NotLike,
        Self::StartsWith,
        Self::EndsWith,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::LessThan,
        Self::LessOrEqual,
        Self::In,
        Self::NotIn,
        Self::Between,
        Self::NotBetween,
        Self::BetweenExclusive,
        Self::OutsideRange,
        Self::OnDate,
        Self::InLastDays,
        Self::InNextDays,
        Self::SizeEq,
        Self::SizeGt,
        Self::SizeLt,
        Self::IsTrue,
        Self::IsFalse,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// The operator name, e.g. `STARTS_WITH`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::Like => "LIKE",
            Self::NotLike => "NOT_LIKE",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::LessThan => "LESS_THAN",
            Self::LessOrEqual => "LESS_OR_EQUAL",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT_BETWEEN",
            Self::BetweenExclusive => "BETWEEN_EXCLUSIVE",
            Self::OutsideRange => "OUTSIDE_RANGE",
            Self::OnDate => "ON_DATE",
            Self::InLastDays => "IN_LAST_DAYS",
            Self::InNextDays => "IN_NEXT_DAYS",
            Self::SizeEq => "SIZE_EQ",
            Self::SizeGt => "SIZE_GT",
            Self::SizeLt => "SIZE_LT",
            Self::IsTrue => "IS_TRUE",
            Self::IsFalse => "IS_FALSE",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
        }
    }

    /// The value shape this operator accepts, for error messages.
    pub fn expects(&self) -> &'static str {
        match self {
            Self::Equal | Self::NotEqual => "a scalar value",
            Self::Like | Self::NotLike | Self::StartsWith | Self::EndsWith => "a string",
            Self::GreaterThan | Self::GreaterOrEqual | Self::LessThan | Self::LessOrEqual => {
                "an ordered scalar (number, string, date or instant)"
            }
            Self::In | Self::NotIn => "a list of scalar values",
            Self::Between | Self::NotBetween | Self::BetweenExclusive | Self::OutsideRange => {
                "a two-element [start, end] range"
            }
            Self::OnDate => "a date",
            Self::InLastDays | Self::InNextDays => "a non-negative number of days",
            Self::SizeEq | Self::SizeGt | Self::SizeLt => "a non-negative integer",
            Self::IsTrue | Self::IsFalse => "any non-null value",
            Self::IsNull | Self::IsNotNull => "a boolean flag",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| {
                QueryError::new(ErrorCode::InvalidFilter, format!("Unknown filter operator '{}'", s))
            })
    }
}

/// Filter metadata attached to one field of a filter object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterDeclaration {
    /// The declared field name, also used to match sort keys.
    pub field: Cow<'static, str>,
    /// The operator.
    pub operation: Operation,
    /// Dot-separated relation path; empty means the field names a root attribute.
    pub relation_path: Cow<'static, str>,
}

impl FilterDeclaration {
    /// Declare a filter on the root attribute named like the field.
    pub fn new(field: impl Into<Cow<'static, str>>, operation: Operation) -> Self {
        Self {
            field: field.into(),
            operation,
            relation_path: Cow::Borrowed(""),
        }
    }

    /// Target a relation path instead of the root attribute.
    pub fn with_relation(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.relation_path = path.into();
        self
    }

    /// Whether a relation path is declared.
    pub fn has_relation(&self) -> bool {
        !self.relation_path.is_empty()
    }
}

type Accessor<F> = Box<dyn Fn(&F) -> QueryResult<Option<FilterInput>> + Send + Sync>;

/// A declaration plus the accessor reading its current value.
pub struct FieldDescriptor<F> {
    declaration: FilterDeclaration,
    accessor: Accessor<F>,
}

impl<F> FieldDescriptor<F> {
    /// The declaration.
    pub fn declaration(&self) -> &FilterDeclaration {
        &self.declaration
    }

    /// Read the field's current value.
    pub fn read(&self, filter: &F) -> QueryResult<Option<FilterInput>> {
        (self.accessor)(filter).map_err(|e| {
            let e = if e.code == ErrorCode::FieldAccess {
                e
            } else {
                QueryError::field_access(self.declaration.field.as_ref(), e.message.clone()).with_source(e)
            };
            e.with_field(self.declaration.field.as_ref())
        })
    }
}

impl<F> fmt::Debug for FieldDescriptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("declaration", &self.declaration)
            .finish_non_exhaustive()
    }
}

/// The ordered declared fields of a filter type.
///
/// Built once per filter type by [`FilterSpec::declarations`], usually through
/// the [`crate::filter_spec!`] macro. A filter that embeds another filter
/// starts from the embedded declarations with [`Declarations::inherit`].
#[derive(Debug)]
pub struct Declarations<F> {
    fields: Vec<FieldDescriptor<F>>,
}

impl<F> Default for Declarations<F> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<F: 'static> Declarations<F> {
    /// No declared fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the declarations of an embedded parent filter.
    pub fn inherit<P: FilterSpec>(project: fn(&F) -> &P) -> Self {
        let fields = P::declarations()
            .fields
            .into_iter()
            .map(|parent| {
                let accessor = parent.accessor;
                FieldDescriptor {
                    declaration: parent.declaration,
                    accessor: Box::new(move |filter: &F| accessor(project(filter))) as Accessor<F>,
                }
            })
            .collect();
        Self { fields }
    }

    /// Declare a field.
    ///
    /// A field with the same name as an inherited one replaces it in place.
    pub fn field<A>(mut self, declaration: FilterDeclaration, accessor: A) -> Self
    where
        A: Fn(&F) -> QueryResult<Option<FilterInput>> + Send + Sync + 'static,
    {
        let descriptor = FieldDescriptor {
            declaration,
            accessor: Box::new(accessor),
        };
        match self
            .fields
            .iter_mut()
            .find(|d| d.declaration.field == descriptor.declaration.field)
        {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
        self
    }
}

impl<F> Declarations<F> {
    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<F>> {
        self.fields.iter()
    }

    /// Find a declaration by field name.
    pub fn get(&self, field: &str) -> Option<&FilterDeclaration> {
        self.fields
            .iter()
            .map(FieldDescriptor::declaration)
            .find(|d| d.field == field)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A filter object whose fields carry filter declarations.
pub trait FilterSpec: Sized + 'static {
    /// The declared fields, in order.
    fn declarations() -> Declarations<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("starts_with".parse::<Operation>().unwrap(), Operation::StartsWith);
        assert!("CONTAINS".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_serde_name() {
        let op: Operation = serde_json::from_str("\"BETWEEN_EXCLUSIVE\"").unwrap();
        assert_eq!(op, Operation::BetweenExclusive);
    }

    #[test]
    fn test_declaration_relation() {
        let decl = FilterDeclaration::new("status", Operation::Equal);
        assert!(!decl.has_relation());
        let decl = decl.with_relation("account.status");
        assert!(decl.has_relation());
        assert_eq!(decl.relation_path, "account.status");
    }

    struct Probe {
        value: Option<i64>,
    }

    #[test]
    fn test_field_override_keeps_position() {
        let decls = Declarations::<Probe>::new()
            .field(FilterDeclaration::new("a", Operation::Equal), |p: &Probe| {
                Ok(p.value.map(Into::into))
            })
            .field(FilterDeclaration::new("b", Operation::Equal), |_: &Probe| Ok(None))
            .field(FilterDeclaration::new("a", Operation::GreaterThan), |p: &Probe| {
                Ok(p.value.map(Into::into))
            });

        let names: Vec<_> = decls.iter().map(|d| d.declaration().field.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(decls.get("a").unwrap().operation, Operation::GreaterThan);
    }

    #[test]
    fn test_accessor_failure_is_field_access() {
        let decls = Declarations::<Probe>::new().field(
            FilterDeclaration::new("broken", Operation::Equal),
            |_: &Probe| Err(QueryError::internal("unreadable")),
        );
        let probe = Probe { value: Some(1) };
        let err = decls.iter().next().unwrap().read(&probe).unwrap_err();
        assert_eq!(err.code, ErrorCode::FieldAccess);
        assert_eq!(err.context.field.as_deref(), Some("broken"));
    }

    #[test]
    fn test_read_value() {
        let decls = Declarations::<Probe>::new().field(
            FilterDeclaration::new("value", Operation::Equal),
            |p: &Probe| Ok(p.value.map(Into::into)),
        );
        let probe = Probe { value: Some(7) };
        assert_eq!(
            decls.iter().next().unwrap().read(&probe).unwrap(),
            Some(FilterInput::Scalar(FilterValue::Int(7)))
        );
    }
}
