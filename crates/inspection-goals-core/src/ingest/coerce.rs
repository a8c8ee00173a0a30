use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::types::MAX_CELL_COUNT;

/// One untyped spreadsheet row: header → cell.
pub type RawRow = Map<String, Value>;

/// Day zero of spreadsheet serial dates (Lotus 1-2-3 leap-year bug included).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const PRIMARY_DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const FALLBACK_DATE_FORMATS: [&str; 3] = ["%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const FALLBACK_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Look a column up by any of `names`, ignoring case and surrounding
/// whitespace in the header.
pub fn field<'a>(row: &'a RawRow, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        row.iter()
            .find(|(k, _)| k.trim().to_lowercase() == *name)
            .map(|(_, v)| v)
    })
}

/// Cell rendered as text. Null is the empty string.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn parse_decimal_text(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_count(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_text(&n.to_string()),
        Value::String(s) => parse_decimal_text(s),
        Value::Bool(true) => Some(Decimal::ONE),
        _ => None,
    }
}

/// Whether a numeric cell exceeds [`MAX_CELL_COUNT`] in magnitude.
pub fn count_out_of_range(value: &Value) -> bool {
    parse_count(value).is_some_and(|d| d.abs() > MAX_CELL_COUNT)
}

/// Numeric coercion for count-like cells. Anything unparseable, or beyond
/// [`MAX_CELL_COUNT`] in magnitude, is zero.
pub fn coerce_count(value: &Value) -> Decimal {
    match parse_count(value) {
        Some(d) if d.abs() > MAX_CELL_COUNT => {
            tracing::warn!(cell = %d, "count cell out of range, treated as missing");
            Decimal::ZERO
        }
        Some(d) => d,
        None => Decimal::ZERO,
    }
}

/// Integer coercion for optional target cells. Blank or non-integer text is
/// `None`; numeric cells truncate toward zero.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a spreadsheet date cell.
///
/// Numbers are serial day counts (fraction ignored). Text tries day-first
/// formats before the fallbacks. Blank or unrecognised cells are `None`.
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(serial_to_date)
            .or_else(|| parse_date_text(&n.to_string())),
        Value::String(s) => parse_date_text(s),
        _ => None,
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    PRIMARY_DATE_FORMATS
        .iter()
        .chain(FALLBACK_DATE_FORMATS.iter())
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Yes/no flag cells. Missing cells take `default`.
pub fn is_truthy(value: Option<&Value>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => matches!(
            cell_text(v).trim().to_uppercase().as_str(),
            "S" | "SIM" | "Y" | "YES" | "TRUE" | "1"
        ),
    }
}
