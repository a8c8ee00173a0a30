use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::coerce::{cell_text, coerce_int, field, is_truthy, RawRow};
use crate::targets::TargetOverride;
use crate::types::{normalize_label, YearMonth};

const URL_COLUMN: &str = "url";
const MONTH_COLUMNS: [&str; 2] = ["mês", "mes"];
const ACTIVE_COLUMN: &str = "ativo";
const BRAND_COLUMN: &str = "empresa";
const UNIT_COLUMN: &str = "unidade";
const WORKDAYS_COLUMN: &str = "dias_uteis";
const TARGET_COLUMN: &str = "meta_mensal";

/// One active monthly data source listed in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub sheet_id: String,
    /// Explicit month from the index; inferred from the data when absent
    pub year_month: Option<YearMonth>,
    /// Raw month cell, kept for diagnostics
    pub label: String,
}

fn url_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("valid sheet url pattern"))
}

fn bare_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{20,}$").expect("valid sheet id pattern"))
}

/// Extract a spreadsheet id from a sharing URL (`.../d/<id>/...`) or accept
/// a bare id of at least 20 URL-safe characters.
pub fn sheet_id(raw: &str) -> Option<String> {
    let s = raw.trim();
    if let Some(caps) = url_id_pattern().captures(s) {
        return Some(caps[1].to_string());
    }
    bare_id_pattern().is_match(s).then(|| s.to_string())
}

fn month_cell(row: &RawRow) -> (Option<YearMonth>, String) {
    let raw = field(row, &MONTH_COLUMNS).map(cell_text).unwrap_or_default();
    (YearMonth::parse_token(&raw), raw.trim().to_string())
}

/// Active rows of the ARQUIVOS tab that carry a usable sheet reference.
pub fn parse_source_index(rows: &[RawRow]) -> Vec<SourceEntry> {
    rows.iter()
        .filter(|row| is_truthy(field(row, &[ACTIVE_COLUMN]), true))
        .filter_map(|row| {
            let url = field(row, &[URL_COLUMN]).map(cell_text).unwrap_or_default();
            let Some(id) = sheet_id(&url) else {
                tracing::debug!(url = %url, "index row without a sheet reference skipped");
                return None;
            };
            let (year_month, label) = month_cell(row);
            Some(SourceEntry {
                sheet_id: id,
                year_month,
                label,
            })
        })
        .collect()
}

/// Explicit target rows from the METAS tab. Rows lacking a valid month,
/// brand or unit are dropped.
pub fn parse_target_overrides(rows: &[RawRow]) -> Vec<TargetOverride> {
    rows.iter()
        .filter_map(|row| {
            let (year_month, _) = month_cell(row);
            let brand = field(row, &[BRAND_COLUMN])
                .map(|v| normalize_label(&cell_text(v)))
                .unwrap_or_default();
            let unit = field(row, &[UNIT_COLUMN])
                .map(|v| normalize_label(&cell_text(v)))
                .unwrap_or_default();
            let year_month = year_month?;
            if brand.is_empty() || unit.is_empty() {
                return None;
            }
            let workdays = field(row, &[WORKDAYS_COLUMN])
                .and_then(coerce_int)
                .and_then(|w| u32::try_from(w).ok());
            let monthly_target = field(row, &[TARGET_COLUMN]).and_then(coerce_int);
            Some(TargetOverride {
                year_month,
                brand,
                unit,
                workdays,
                monthly_target,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ID: &str = "1L55P-vJifVEg6BHBGVLd00m3AXsz7hEyCPMA60G6Jms";

    fn rows(v: serde_json::Value) -> Vec<RawRow> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_sheet_id_from_url_and_bare_id() {
        let url = format!("https://docs.google.com/spreadsheets/d/{ID}/edit#gid=0");
        assert_eq!(sheet_id(&url).as_deref(), Some(ID));
        assert_eq!(sheet_id(&format!("  {ID} ")).as_deref(), Some(ID));
        assert_eq!(sheet_id("short-id"), None);
        assert_eq!(sheet_id(""), None);
    }

    #[test]
    fn test_source_index_keeps_active_rows_with_ids() {
        let raw = rows(json!([
            { "URL": ID, "MÊS": "03/2024", "ATIVO": "sim" },
            { "URL": ID, "MÊS": "02/2024", "ATIVO": "N" },
            { "URL": "not a sheet", "MÊS": "01/2024" },
            { "URL": ID, "MES": "2023-12" },
            { "URL": ID }
        ]));
        let entries = parse_source_index(&raw);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].year_month, Some(YearMonth::new(2024, 3).unwrap()));
        assert_eq!(entries[1].year_month, Some(YearMonth::new(2023, 12).unwrap()));
        assert_eq!(entries[2].year_month, None);
    }

    #[test]
    fn test_target_overrides_parse_optional_integers() {
        let raw = rows(json!([
            { "MÊS": "03/2024", "EMPRESA": "tokyo", "UNIDADE": " chapadinha ", "DIAS_UTEIS": 20, "META_MENSAL": "" },
            { "MÊS": "2024-03", "EMPRESA": "LOG", "UNIDADE": "TIMON", "DIAS_UTEIS": "", "META_MENSAL": "900" },
            { "MÊS": "", "EMPRESA": "LOG", "UNIDADE": "TIMON", "META_MENSAL": 1 },
            { "MÊS": "03/2024", "EMPRESA": "", "UNIDADE": "TIMON" },
            { "MÊS": "03/2024", "EMPRESA": "LOG", "UNIDADE": "CAROLINA", "DIAS_UTEIS": "vinte" }
        ]));
        let out = parse_target_overrides(&raw);
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(
            out,
            vec![
                TargetOverride {
                    year_month: march,
                    brand: "TOKYO".into(),
                    unit: "CHAPADINHA".into(),
                    workdays: Some(20),
                    monthly_target: None,
                },
                TargetOverride {
                    year_month: march,
                    brand: "LOG".into(),
                    unit: "TIMON".into(),
                    workdays: None,
                    monthly_target: Some(900),
                },
                TargetOverride {
                    year_month: march,
                    brand: "LOG".into(),
                    unit: "CAROLINA".into(),
                    workdays: None,
                    monthly_target: None,
                },
            ]
        );
    }
}
