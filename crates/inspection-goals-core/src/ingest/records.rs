use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::coerce::{cell_text, coerce_count, count_out_of_range, field, parse_date_value, RawRow};
use crate::types::{normalize_label, ProductionRecord, YearMonth};

const BRAND_COLUMN: &str = "empresa";
const UNIT_COLUMN: &str = "unidade";
const GROSS_COLUMN: &str = "total";
const REINSPECTION_COLUMN: &str = "revistorias";
const PCT_190_COLUMN: &str = "%_190";
const QTY_152_COLUMN: &str = "qtd_152";
const QTY_190_COLUMN: &str = "qtd_190";
const DATE_COLUMNS: [&str; 2] = ["data_relatorio", "data"];
const COUNT_COLUMNS: [&str; 5] = [
    GROSS_COLUMN,
    REINSPECTION_COLUMN,
    PCT_190_COLUMN,
    QTY_152_COLUMN,
    QTY_190_COLUMN,
];

/// Mapping from raw unit names to their canonical unit.
///
/// Applied exactly once, while rows are normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAliases {
    map: BTreeMap<String, String>,
}

impl UnitAliases {
    pub fn new(map: &BTreeMap<String, String>) -> Self {
        let map = map
            .iter()
            .map(|(from, to)| (normalize_label(from), normalize_label(to)))
            .collect();
        UnitAliases { map }
    }

    /// No aliasing at all.
    pub fn none() -> Self {
        UnitAliases {
            map: BTreeMap::new(),
        }
    }

    /// Canonical name for an already-normalized unit label.
    pub fn canonical(&self, unit: &str) -> String {
        self.map
            .get(unit)
            .cloned()
            .unwrap_or_else(|| unit.to_string())
    }
}

impl Default for UnitAliases {
    fn default() -> Self {
        UnitAliases::new(&crate::config::DashboardSettings::default().unit_aliases)
    }
}

/// The normalized rows of one period sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBatch {
    /// Explicit token, or the month of the latest date seen in the rows
    pub year_month: Option<YearMonth>,
    pub records: Vec<ProductionRecord>,
    /// Rows whose date cell was missing or unparseable
    pub undated_rows: usize,
    /// Numeric cells too large to be counts, read as zero
    #[serde(default)]
    pub out_of_range_cells: usize,
}

/// Normalize raw rows from one period sheet.
///
/// Labels are trimmed, whitespace-collapsed and upper-cased; unit aliases
/// are applied; numeric columns coerce to zero when missing or invalid.
pub fn normalize_source_rows(
    rows: &[RawRow],
    token: Option<YearMonth>,
    aliases: &UnitAliases,
) -> SourceBatch {
    let label = |row: &RawRow, col: &str| {
        field(row, &[col])
            .map(|v| normalize_label(&cell_text(v)))
            .unwrap_or_default()
    };
    let number = |row: &RawRow, col: &str| {
        field(row, &[col]).map(coerce_count).unwrap_or_default()
    };

    let mut records: Vec<ProductionRecord> = rows
        .iter()
        .map(|row| ProductionRecord {
            brand: label(row, BRAND_COLUMN),
            unit: aliases.canonical(&label(row, UNIT_COLUMN)),
            date: field(row, &DATE_COLUMNS).and_then(parse_date_value),
            year_month: None,
            gross_count: number(row, GROSS_COLUMN),
            reinspection_count: number(row, REINSPECTION_COLUMN),
            qty_at_price_152: number(row, QTY_152_COLUMN),
            qty_at_price_190: number(row, QTY_190_COLUMN),
            pct_at_or_above_190: number(row, PCT_190_COLUMN),
        })
        .collect();

    let undated_rows = records.iter().filter(|r| r.date.is_none()).count();
    let out_of_range_cells = rows
        .iter()
        .flat_map(|row| COUNT_COLUMNS.iter().filter_map(move |col| field(row, &[*col])))
        .filter(|v| count_out_of_range(v))
        .count();
    let year_month = token.or_else(|| records.iter().filter_map(|r| r.date).max().map(YearMonth::of));
    for r in &mut records {
        r.year_month = year_month;
    }

    SourceBatch {
        year_month,
        records,
        undated_rows,
        out_of_range_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn rows(v: serde_json::Value) -> Vec<RawRow> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_normalizes_labels_numbers_and_dates() {
        let raw = rows(json!([
            {
                "empresa": " starcheck ",
                "unidade": "são   luís",
                "data_relatorio": "04/03/2024",
                "total": "120",
                "revistorias": 20,
                "%_190": 27.5,
                "qtd_152": 60,
                "qtd_190": "x"
            }
        ]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::default());
        let r = &batch.records[0];
        assert_eq!(r.brand, "STARCHECK");
        assert_eq!(r.unit, "SÃO LUÍS");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(r.gross_count, dec!(120));
        assert_eq!(r.reinspection_count, dec!(20));
        assert_eq!(r.pct_at_or_above_190, dec!(27.5));
        assert_eq!(r.qty_at_price_152, dec!(60));
        assert_eq!(r.qty_at_price_190, dec!(0));
        assert_eq!(batch.undated_rows, 0);
    }

    #[test]
    fn test_oversized_cells_read_as_zero() {
        let raw = rows(json!([
            {
                "empresa": "LOG",
                "unidade": "TIMON",
                "data": "01/03/2024",
                "total": "1e27",
                "revistorias": 2,
                "qtd_152": "1e27",
                "qtd_190": 1e27
            }
        ]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::none());
        let r = &batch.records[0];
        assert_eq!(r.gross_count, dec!(0));
        assert_eq!(r.qty_at_price_152, dec!(0));
        assert_eq!(r.qty_at_price_190, dec!(0));
        assert_eq!(r.net(), dec!(-2));
        assert_eq!(batch.out_of_range_cells, 3);
    }

    #[test]
    fn test_missing_numeric_columns_are_zero() {
        let raw = rows(json!([{ "EMPRESA": "LOG", "UNIDADE": "TIMON", "Data": "2024-03-01" }]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::none());
        let r = &batch.records[0];
        assert_eq!(r.brand, "LOG");
        assert_eq!(r.gross_count, dec!(0));
        assert_eq!(r.net(), dec!(0));
    }

    #[test]
    fn test_alias_merges_units() {
        let raw = rows(json!([
            { "empresa": "STARCHECK", "unidade": "Riachão", "total": 5 },
            { "empresa": "STARCHECK", "unidade": "RIACHAO", "total": 5 }
        ]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::default());
        assert!(batch.records.iter().all(|r| r.unit == "BALSAS"));
    }

    #[test]
    fn test_year_month_inferred_from_latest_date() {
        let raw = rows(json!([
            { "empresa": "LOG", "unidade": "TIMON", "data": "28/02/2024" },
            { "empresa": "LOG", "unidade": "TIMON", "data": "01/03/2024" },
            { "empresa": "LOG", "unidade": "TIMON", "data": "" }
        ]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::none());
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(batch.year_month, Some(march));
        assert_eq!(batch.undated_rows, 1);
        assert!(batch.records.iter().all(|r| r.year_month == Some(march)));
    }

    #[test]
    fn test_explicit_token_wins_over_dates() {
        let raw = rows(json!([{ "empresa": "LOG", "unidade": "TIMON", "data": "01/03/2024" }]));
        let feb = YearMonth::new(2024, 2).unwrap();
        let batch = normalize_source_rows(&raw, Some(feb), &UnitAliases::none());
        assert_eq!(batch.year_month, Some(feb));
    }

    #[test]
    fn test_no_dates_and_no_token_leaves_month_unknown() {
        let raw = rows(json!([{ "empresa": "LOG", "unidade": "TIMON", "total": 1 }]));
        let batch = normalize_source_rows(&raw, None, &UnitAliases::none());
        assert_eq!(batch.year_month, None);
        assert_eq!(batch.undated_rows, 1);
    }
}
