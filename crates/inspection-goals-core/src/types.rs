use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GoalsError;

/// Inspection quantities. Decimal because spreadsheet cells may carry fractions.
pub type Count = Decimal;

/// Percentage points (100 = exactly on target). Never a 0..1 fraction.
pub type Percent = Decimal;

/// Ticket prices in BRL
pub type Price = Decimal;

/// Largest magnitude a single spreadsheet count cell may carry. Larger cells
/// are treated as missing.
pub const MAX_CELL_COUNT: Count = rust_decimal_macros::dec!(1000000000000);

/// Largest magnitude accepted for an aggregated gross or re-inspection total.
pub const MAX_TOTAL_COUNT: Count = rust_decimal_macros::dec!(1000000000000000000);

/// Trim, collapse inner whitespace to single spaces and upper-case.
pub fn normalize_label(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// A calendar month, serialized as the canonical `YYYY-MM` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, GoalsError> {
        if !(1..=12).contains(&month) {
            return Err(GoalsError::InvalidYearMonth(format!("{year}-{month}")));
        }
        Ok(YearMonth { year, month })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Lenient parse used on spreadsheet cells: accepts `YYYY-MM` and
    /// `MM/YYYY`, returns `None` for anything else.
    pub fn parse_token(raw: &str) -> Option<Self> {
        let s = raw.trim();
        let b = s.as_bytes();
        let digits = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);

        let (year, month) = if b.len() == 7 && b[4] == b'-' && digits(0..4) && digits(5..7) {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?)
        } else if b.len() == 7 && b[2] == b'/' && digits(0..2) && digits(3..7) {
            (s[3..7].parse().ok()?, s[0..2].parse().ok()?)
        } else {
            return None;
        };
        YearMonth::new(year, month).ok()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = GoalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YearMonth::parse_token(s).ok_or_else(|| GoalsError::InvalidYearMonth(s.to_string()))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = GoalsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// One normalized row of a per-period production sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Company brand, normalized upper-case (e.g. "TOKYO")
    pub brand: String,
    /// Operating unit, normalized and alias-merged (e.g. "BALSAS")
    pub unit: String,
    pub date: Option<NaiveDate>,
    /// Month token of the source sheet this row came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_month: Option<YearMonth>,
    pub gross_count: Count,
    pub reinspection_count: Count,
    pub qty_at_price_152: Count,
    pub qty_at_price_190: Count,
    /// Share of inspections at or above R$190, in percentage points
    pub pct_at_or_above_190: Percent,
}

impl ProductionRecord {
    /// Gross minus re-inspections. Not clamped.
    pub fn net(&self) -> Count {
        self.gross_count - self.reinspection_count
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_year_month_parses_both_token_shapes() {
        let a = YearMonth::parse_token("2024-03").unwrap();
        let b = YearMonth::parse_token(" 03/2024 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2024-03");
    }

    #[test]
    fn test_year_month_rejects_garbage() {
        assert!(YearMonth::parse_token("3/2024").is_none());
        assert!(YearMonth::parse_token("2024-13").is_none());
        assert!(YearMonth::parse_token("março").is_none());
        assert!(YearMonth::parse_token("").is_none());
        assert!("2024/03".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_serde_uses_token() {
        let ym = YearMonth::new(2024, 7).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2024-07\"");
        let back: YearMonth = serde_json::from_str("\"07/2024\"").unwrap();
        assert_eq!(back, ym);
    }

    #[test]
    fn test_year_month_ordering_follows_calendar() {
        let dec23 = YearMonth::new(2023, 12).unwrap();
        let jan24 = YearMonth::new(2024, 1).unwrap();
        assert!(dec23 < jan24);
    }

    #[test]
    fn test_normalize_label_collapses_whitespace() {
        assert_eq!(normalize_label("  são   josé de\tribamar "), "SÃO JOSÉ DE RIBAMAR");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_record_net_is_not_clamped() {
        let r = ProductionRecord {
            gross_count: dec!(3),
            reinspection_count: dec!(5),
            ..Default::default()
        };
        assert_eq!(r.net(), dec!(-2));
    }
}
