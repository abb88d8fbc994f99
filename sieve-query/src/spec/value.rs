//! Typed runtime values of declared filter fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{Deserialize, Deserializer, Error as _};

use crate::error::{ErrorCode, QueryError, QueryResult};
use crate::filter::FilterValue;

/// The current value of a declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    /// A single value.
    Scalar(FilterValue),
    /// A list of values, for membership operators.
    List(ListValue),
    /// A validated `[start, end]` pair, for range operators.
    Range(RangeValue),
}

impl FilterInput {
    /// Whether the input carries no value at all.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(FilterValue::Null))
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(value) => value.kind().to_string(),
            Self::List(list) => format!("list of {}", list.len()),
            Self::Range(range) => format!("{} range", range.start().kind()),
        }
    }
}

impl From<FilterValue> for FilterInput {
    fn from(v: FilterValue) -> Self {
        Self::Scalar(v)
    }
}

macro_rules! scalar_input {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FilterInput {
                fn from(v: $ty) -> Self {
                    Self::Scalar(FilterValue::from(v))
                }
            }
        )*
    };
}

scalar_input!(bool, i32, i64, f64, String, &str, NaiveDate, DateTime<Utc>);

impl<T: Into<FilterValue>> From<Vec<T>> for FilterInput {
    fn from(v: Vec<T>) -> Self {
        Self::List(ListValue::new(v))
    }
}

impl From<ListValue> for FilterInput {
    fn from(v: ListValue) -> Self {
        Self::List(v)
    }
}

impl From<RangeValue> for FilterInput {
    fn from(v: RangeValue) -> Self {
        Self::Range(v)
    }
}

/// Values for IN / NOT_IN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListValue(Vec<FilterValue>);

impl ListValue {
    /// Create a list.
    pub fn new<T: Into<FilterValue>>(values: impl IntoIterator<Item = T>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// The values.
    pub fn values(&self) -> &[FilterValue] {
        &self.0
    }

    /// Take the values.
    pub fn into_values(self) -> Vec<FilterValue> {
        self.0
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Comparable families; both ends of a range must belong to the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Numeric,
    Text,
    Temporal,
}

fn family(value: &FilterValue) -> Option<Family> {
    match value {
        FilterValue::Int(_) | FilterValue::Float(_) => Some(Family::Numeric),
        FilterValue::String(_) => Some(Family::Text),
        FilterValue::Date(_) | FilterValue::DateTime(_) => Some(Family::Temporal),
        _ => None,
    }
}

/// An inclusive `[start, end]` pair of comparable values.
///
/// ```rust
/// use sieve_query::spec::RangeValue;
///
/// assert!(RangeValue::new(1i64, 10i64).is_ok());
/// assert!(RangeValue::new(1i64, "ten").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    start: FilterValue,
    end: FilterValue,
}

impl RangeValue {
    /// Create a range, checking that both ends are comparable with each other.
    pub fn new(start: impl Into<FilterValue>, end: impl Into<FilterValue>) -> QueryResult<Self> {
        let start = start.into();
        let end = end.into();

        match (family(&start), family(&end)) {
            (Some(a), Some(b)) if a == b => Ok(Self { start, end }),
            _ => Err(QueryError::new(
                ErrorCode::InvalidFilterValue,
                format!(
                    "Range endpoints must be two comparable values, found {} and {}",
                    start.kind(),
                    end.kind()
                ),
            )),
        }
    }

    /// The lower bound.
    pub fn start(&self) -> &FilterValue {
        &self.start
    }

    /// The upper bound.
    pub fn end(&self) -> &FilterValue {
        &self.end
    }

    /// Both ends are calendar dates.
    pub fn is_date_pair(&self) -> bool {
        matches!((&self.start, &self.end), (FilterValue::Date(_), FilterValue::Date(_)))
    }

    /// Both ends are dates or instants.
    pub fn is_temporal(&self) -> bool {
        family(&self.start) == Some(Family::Temporal)
    }

    /// Take both bounds.
    pub fn into_bounds(self) -> (FilterValue, FilterValue) {
        (self.start, self.end)
    }
}

impl TryFrom<Vec<FilterValue>> for RangeValue {
    type Error = QueryError;

    fn try_from(values: Vec<FilterValue>) -> Result<Self, Self::Error> {
        let len = values.len();
        let mut values = values.into_iter();
        match (values.next(), values.next(), values.next()) {
            (Some(start), Some(end), None) => Self::new(start, end),
            _ => Err(QueryError::new(
                ErrorCode::InvalidFilterValue,
                format!("Range needs exactly two values, found {}", len),
            )),
        }
    }
}

impl TryFrom<ListValue> for RangeValue {
    type Error = QueryError;

    fn try_from(list: ListValue) -> Result<Self, Self::Error> {
        Self::try_from(list.into_values())
    }
}

/// Deserializes from a two-element array.
///
/// Text endpoints in `YYYY-MM-DD` or RFC 3339 form are read as dates and
/// instants, so ranges taken from request bodies stay temporal.
impl<'de> Deserialize<'de> for RangeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [start, end] = <[FilterValue; 2]>::deserialize(deserializer)?;
        Self::new(temporal(start), temporal(end)).map_err(D::Error::custom)
    }
}

fn temporal(value: FilterValue) -> FilterValue {
    let FilterValue::String(text) = &value else {
        return value;
    };
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return FilterValue::Date(date);
    }
    match DateTime::parse_from_rfc3339(text) {
        Ok(instant) => FilterValue::DateTime(instant.with_timezone(&Utc)),
        Err(_) => value,
    }
}

/// Read a declared field as an optional [`FilterInput`].
///
/// Implemented for every `Option<T>` whose `T` converts into an input, which
/// covers the usual filter struct fields (`Option<String>`, `Option<i64>`,
/// `Option<Vec<String>>`, `Option<NaiveDate>`, ...).
pub trait ToFilterInput {
    /// The current value, or `None` when the field is unset.
    fn to_filter_input(&self) -> QueryResult<Option<FilterInput>>;
}

impl<T: Clone + Into<FilterInput>> ToFilterInput for Option<T> {
    fn to_filter_input(&self) -> QueryResult<Option<FilterInput>> {
        Ok(self.clone().map(Into::into))
    }
}
