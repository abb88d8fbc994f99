//! Predicate construction, one strategy per [`Operation`].
//!
//! Every operator is handled by the exhaustive match in [`build`]. Value
//! shapes are checked here; a value that does not fit its operator is an
//! [`ErrorCode::InvalidFilterValue`] error, never silently dropped.
//!
//! [`ErrorCode::InvalidFilterValue`]: crate::ErrorCode::InvalidFilterValue

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::warn;

use super::declaration::Operation;
use super::value::{FilterInput, RangeValue};
use crate::criteria::CriteriaBuilder;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// Inputs shared by every predicate of one compilation.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext {
    /// The instant relative day windows are measured from.
    pub now: DateTime<Utc>,
    /// Largest list accepted by `IN` / `NOT_IN`.
    pub max_list_len: usize,
}

/// Build the predicate for one operator applied to `attr`.
pub fn build<B: CriteriaBuilder>(
    builder: &B,
    op: Operation,
    attr: &B::Attr,
    input: FilterInput,
    ctx: &BuildContext,
) -> QueryResult<B::Predicate> {
    let predicate = match op {
        Operation::Equal => builder.equal(attr, scalar(op, input)?),
        Operation::NotEqual => builder.not_equal(attr, scalar(op, input)?),

        Operation::Like => builder.like(&builder.lower(attr), format!("%{}%", text(op, input)?)),
        Operation::NotLike => {
            builder.not(builder.like(&builder.lower(attr), format!("%{}%", text(op, input)?)))
        }
        Operation::StartsWith => builder.like(&builder.lower(attr), format!("{}%", text(op, input)?)),
        Operation::EndsWith => builder.like(&builder.lower(attr), format!("%{}", text(op, input)?)),

        Operation::GreaterThan => {
            let (attr, value) = ordered(builder, op, attr, input)?;
            builder.greater_than(&attr, value)
        }
        Operation::GreaterOrEqual => {
            let (attr, value) = ordered(builder, op, attr, input)?;
            builder.greater_or_equal(&attr, value)
        }
        Operation::LessThan => {
            let (attr, value) = ordered(builder, op, attr, input)?;
            builder.less_than(&attr, value)
        }
        Operation::LessOrEqual => {
            let (attr, value) = ordered(builder, op, attr, input)?;
            builder.less_or_equal(&attr, value)
        }

        Operation::In => builder.is_in(attr, list(op, input, ctx)?),
        Operation::NotIn => builder.not(builder.is_in(attr, list(op, input, ctx)?)),

        Operation::Between => {
            let (attr, start, end) = range(builder, op, attr, input)?;
            builder.between(&attr, start, end)
        }
        Operation::NotBetween => {
            let (attr, start, end) = range(builder, op, attr, input)?;
            builder.not(builder.between(&attr, start, end))
        }
        Operation::BetweenExclusive => {
            let (attr, start, end) = range(builder, op, attr, input)?;
            builder.and(vec![
                builder.greater_than(&attr, start),
                builder.less_than(&attr, end),
            ])
        }
        Operation::OutsideRange => {
            let (attr, min, max) = range(builder, op, attr, input)?;
            builder.or(vec![builder.less_than(&attr, min), builder.greater_than(&attr, max)])
        }

        Operation::OnDate => {
            let day = date(op, input)?;
            let next = day
                .checked_add_days(Days::new(1))
                .ok_or_else(|| QueryError::invalid_value(op.as_str(), op.expects(), day.to_string()))?;
            let attr = builder.as_instant(attr);
            builder.and(vec![
                builder.greater_or_equal(&attr, start_of_day(day).into()),
                builder.less_than(&attr, start_of_day(next).into()),
            ])
        }
        Operation::InLastDays => {
            let window = days(op, input)?;
            let from = ctx
                .now
                .checked_sub_signed(window)
                .ok_or_else(|| out_of_range(op, window))?;
            builder.between(&builder.as_instant(attr), from.into(), ctx.now.into())
        }
        Operation::InNextDays => {
            let window = days(op, input)?;
            let until = ctx
                .now
                .checked_add_signed(window)
                .ok_or_else(|| out_of_range(op, window))?;
            builder.between(&builder.as_instant(attr), ctx.now.into(), until.into())
        }

        Operation::SizeEq => builder.equal(&size(builder, op, attr)?, count(op, input)?),
        Operation::SizeGt => builder.greater_than(&size(builder, op, attr)?, count(op, input)?),
        Operation::SizeLt => builder.less_than(&size(builder, op, attr)?, count(op, input)?),

        Operation::IsTrue => builder.equal(attr, FilterValue::Bool(true)),
        Operation::IsFalse => builder.equal(attr, FilterValue::Bool(false)),

        Operation::IsNull => {
            if flag(op, input)? {
                builder.is_null(attr)
            } else {
                builder.conjunction()
            }
        }
        Operation::IsNotNull => {
            if flag(op, input)? {
                builder.is_not_null(attr)
            } else {
                builder.conjunction()
            }
        }
    };
    Ok(predicate)
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Replace a calendar date by its start-of-day instant.
fn normalize(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::Date(date) => FilterValue::DateTime(start_of_day(date)),
        other => other,
    }
}

fn mismatch(op: Operation, input: &FilterInput) -> QueryError {
    QueryError::invalid_value(op.as_str(), op.expects(), input.describe())
}

fn out_of_range(op: Operation, window: TimeDelta) -> QueryError {
    QueryError::invalid_value(
        op.as_str(),
        op.expects(),
        format!("{} days, out of the representable range", window.num_days()),
    )
}

fn scalar(op: Operation, input: FilterInput) -> QueryResult<FilterValue> {
    match input {
        FilterInput::Scalar(FilterValue::List(_) | FilterValue::Null) => Err(mismatch(op, &input)),
        FilterInput::Scalar(value) => Ok(value),
        other => Err(mismatch(op, &other)),
    }
}

/// The lower-cased text of a pattern operator. `%` and `_` are passed through.
fn text(op: Operation, input: FilterInput) -> QueryResult<String> {
    match input {
        FilterInput::Scalar(FilterValue::String(s)) => Ok(s.to_lowercase()),
        other => Err(mismatch(op, &other)),
    }
}

fn ordered<B: CriteriaBuilder>(
    builder: &B,
    op: Operation,
    attr: &B::Attr,
    input: FilterInput,
) -> QueryResult<(B::Attr, FilterValue)> {
    match input {
        FilterInput::Scalar(FilterValue::Date(date)) => {
            Ok((builder.as_instant(attr), FilterValue::DateTime(start_of_day(date))))
        }
        FilterInput::Scalar(value) if value.is_ordered() => Ok((attr.clone(), value)),
        other => Err(mismatch(op, &other)),
    }
}

fn list(op: Operation, input: FilterInput, ctx: &BuildContext) -> QueryResult<Vec<FilterValue>> {
    let values = match input {
        FilterInput::List(list) => list.into_values(),
        FilterInput::Scalar(FilterValue::List(values)) => values,
        other => return Err(mismatch(op, &other)),
    };

    if values.len() > ctx.max_list_len {
        return Err(QueryError::invalid_value(
            op.as_str(),
            op.expects(),
            format!("list of {} (limit {})", values.len(), ctx.max_list_len),
        )
        .with_help("Raise max_list_len in CompilerConfig or narrow the filter"));
    }
    if values.is_empty() {
        warn!(operation = %op, "empty membership list matches no rows");
    }
    Ok(values)
}

fn range<B: CriteriaBuilder>(
    builder: &B,
    op: Operation,
    attr: &B::Attr,
    input: FilterInput,
) -> QueryResult<(B::Attr, FilterValue, FilterValue)> {
    let range = match input {
        FilterInput::Range(range) => range,
        FilterInput::List(list) => RangeValue::try_from(list).map_err(|e| e.with_operation(op.as_str()))?,
        FilterInput::Scalar(FilterValue::List(values)) => {
            RangeValue::try_from(values).map_err(|e| e.with_operation(op.as_str()))?
        }
        other => return Err(mismatch(op, &other)),
    };

    let has_date = matches!(range.start(), FilterValue::Date(_)) || matches!(range.end(), FilterValue::Date(_));
    if range.is_temporal() && has_date {
        let (start, end) = range.into_bounds();
        Ok((builder.as_instant(attr), normalize(start), normalize(end)))
    } else {
        let (start, end) = range.into_bounds();
        Ok((attr.clone(), start, end))
    }
}

fn date(op: Operation, input: FilterInput) -> QueryResult<NaiveDate> {
    match input {
        FilterInput::Scalar(FilterValue::Date(date)) => Ok(date),
        FilterInput::Scalar(FilterValue::DateTime(instant)) => Ok(instant.date_naive()),
        other => Err(mismatch(op, &other)),
    }
}

fn non_negative(op: Operation, input: FilterInput) -> QueryResult<i64> {
    match input {
        FilterInput::Scalar(FilterValue::Int(n)) if n >= 0 => Ok(n),
        FilterInput::Scalar(FilterValue::Int(n)) => Err(QueryError::invalid_value(
            op.as_str(),
            op.expects(),
            n.to_string(),
        )),
        other => Err(mismatch(op, &other)),
    }
}

fn days(op: Operation, input: FilterInput) -> QueryResult<TimeDelta> {
    let n = non_negative(op, input)?;
    TimeDelta::try_days(n).ok_or_else(|| {
        QueryError::invalid_value(op.as_str(), op.expects(), format!("{} days", n))
    })
}

fn count(op: Operation, input: FilterInput) -> QueryResult<FilterValue> {
    non_negative(op, input).map(FilterValue::Int)
}

fn size<B: CriteriaBuilder>(builder: &B, op: Operation, attr: &B::Attr) -> QueryResult<B::Attr> {
    builder.size(attr).map_err(|e| e.with_operation(op.as_str()))
}

fn flag(op: Operation, input: FilterInput) -> QueryResult<bool> {
    match input {
        FilterInput::Scalar(FilterValue::Bool(flag)) => Ok(flag),
        other => Err(mismatch(op, &other)),
    }
}
