use chrono::{NaiveDate, NaiveDateTime};
use outlay_core::Money;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Date-only layouts, tried in order. `01/02/2024` matches both US and
/// day-first layouts; the earlier entry wins.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

/// Timestamp layouts tried after every date-only layout fails. The time of
/// day is discarded.
pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AmountProblem {
    Unparseable,
    OutOfRange,
}

/// First format that parses wins; `None` when nothing does.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Strips currency symbols and thousands separators.
pub fn clean_amount(s: &str) -> String {
    s.trim().replace(['$', ','], "").trim().to_string()
}

/// Magnitude at which a numeric amount is out of range before any exact
/// decimal parse, including values too large for `Decimal`.
const FLOAT_CEILING: f64 = 1e7;

pub(crate) fn parse_amount(s: &str) -> Result<Money, AmountProblem> {
    let cleaned = clean_amount(s);
    if cleaned.is_empty() {
        return Err(AmountProblem::Unparseable);
    }

    // f64 grammar decides what counts as a number: `_` separators are rejected.
    let float: f64 = cleaned.parse().map_err(|_| AmountProblem::Unparseable)?;
    if float.is_nan() {
        return Err(AmountProblem::Unparseable);
    }
    if float.is_infinite() || float.abs() >= FLOAT_CEILING {
        return Err(AmountProblem::OutOfRange);
    }

    // Past the ceiling check, a value neither path can represent has underflowed.
    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
        .or_else(|| Decimal::from_f64(float))
        .unwrap_or(Decimal::ZERO);

    if !Money::decimal_within_limits(value) {
        return Err(AmountProblem::OutOfRange);
    }
    Ok(Money::from_decimal(value))
}
