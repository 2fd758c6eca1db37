//! Pure conversions from raw page text to typed field values.

use crate::core::{ClosedPeriod, ErrorKind};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

const LABEL_SEPARATOR: char = '：';

/// Value half of a `标签：值 | 附注` cell.
pub fn labelled_value(text: &str) -> Result<String, ErrorKind> {
    let (_, value) = text
        .split_once(LABEL_SEPARATOR)
        .ok_or_else(|| ErrorKind::field_parse(format!("no '{LABEL_SEPARATOR}' in '{text}'")))?;
    let value = value.split('|').next().unwrap_or(value);
    Ok(value.trim().to_string())
}

/// Fund scale in 亿: the first decimal number in the text.
pub fn parse_scale(text: &str) -> Result<Decimal, ErrorKind> {
    let number = DECIMAL_RE
        .find(text)
        .ok_or_else(|| ErrorKind::field_parse(format!("no decimal number in '{text}'")))?;
    Decimal::from_str(number.as_str())
        .map_err(|e| ErrorKind::field_parse(format!("bad scale '{}': {e}", number.as_str())))
}

fn scaled_integer(text: &str, factor: u32) -> Result<u32, ErrorKind> {
    let number = INTEGER_RE
        .find(text)
        .ok_or_else(|| ErrorKind::field_parse(format!("no number in '{text}'")))?;
    number
        .as_str()
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(factor))
        .ok_or_else(|| ErrorKind::field_parse(format!("number out of range in '{text}'")))
}

/// Closed period text such as `封闭期：2年` or `3个月`, in months.
pub fn parse_closed_period(text: &str) -> Result<ClosedPeriod, ErrorKind> {
    let value = text
        .split_once(LABEL_SEPARATOR)
        .map_or(text, |(_, value)| value)
        .trim();

    if value.contains('年') {
        Ok(ClosedPeriod::Months(scaled_integer(value, 12)?))
    } else if value.contains("个月") {
        Ok(ClosedPeriod::Months(scaled_integer(value, 1)?))
    } else {
        Ok(ClosedPeriod::Unknown(value.to_string()))
    }
}

/// Applicable holding period of a redemption tier, in days.
///
/// Only day and year units are recognized; anything else is a [`ErrorKind::Unit`]
/// failure rather than a guess.
pub fn parse_redemption_period_days(text: &str) -> Result<String, ErrorKind> {
    if text.contains('天') {
        Ok(scaled_integer(text, 1)?.to_string())
    } else if text.contains('年') {
        Ok(scaled_integer(text, 365)?.to_string())
    } else {
        Err(ErrorKind::Unit(text.to_string()))
    }
}

/// Display name without its `(code)` suffix.
pub fn short_name(text: &str) -> String {
    text.split(['(', '（'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Left side of a `start~end` tenure range.
pub fn tenure_start(text: &str) -> String {
    text.split('~').next().unwrap_or_default().trim().to_string()
}

pub fn parse_iso_date(text: &str) -> Result<NaiveDate, ErrorKind> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| ErrorKind::field_parse(format!("bad date '{text}': {e}")))
}

/// Per-share dividend from text like `每份派现金0.0100元`.
pub fn parse_dividend_per_share(text: &str) -> Option<f64> {
    DECIMAL_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
