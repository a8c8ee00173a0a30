use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::coerce::RawRow;
use super::index::{parse_source_index, parse_target_overrides};
use super::records::{normalize_source_rows, UnitAliases};
use crate::error::GoalsError;
use crate::targets::{TargetOverride, TargetReference, TargetResolver};
use crate::types::{with_metadata, ComputationOutput, ProductionRecord, YearMonth};
use crate::GoalsResult;

/// A logical table the data-access layer can be asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetRef {
    /// The ARQUIVOS tab of the index spreadsheet
    SourceIndex,
    /// The METAS tab of the index spreadsheet
    TargetIndex,
    /// First worksheet of a per-period spreadsheet
    Period(String),
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::SourceIndex => write!(f, "ARQUIVOS"),
            SheetRef::TargetIndex => write!(f, "METAS"),
            SheetRef::Period(id) => write!(f, "{id}"),
        }
    }
}

/// Row retrieval from the spreadsheet backend.
///
/// Implementations own transport, credentials, retries and caching; every
/// call returns a static snapshot of the table.
pub trait RowSource {
    fn fetch_rows(&self, sheet: &SheetRef) -> GoalsResult<Vec<RawRow>>;
}

/// A period sheet that was read successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedSource {
    pub sheet_id: String,
    pub year_month: Option<YearMonth>,
    pub rows: usize,
    pub undated_rows: usize,
}

/// A period sheet that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub label: String,
    pub reason: String,
}

/// Everything one dashboard request computes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<ProductionRecord>,
    pub overrides: Vec<TargetOverride>,
    pub sources: Vec<LoadedSource>,
    pub failures: Vec<SourceFailure>,
}

impl Snapshot {
    /// A resolver over `reference` and this snapshot's target overrides.
    pub fn resolver(&self, reference: TargetReference) -> TargetResolver {
        TargetResolver::new(reference, self.overrides.iter().cloned())
    }

    /// Month token of the last loaded source that has one.
    pub fn latest_token(&self) -> Option<YearMonth> {
        self.sources.iter().rev().find_map(|s| s.year_month)
    }

    /// Distinct months with dated records, ascending.
    pub fn months_with_data(&self) -> Vec<YearMonth> {
        let mut months: Vec<YearMonth> = self
            .records
            .iter()
            .filter_map(|r| r.date.map(YearMonth::of))
            .collect();
        months.sort();
        months.dedup();
        months
    }
}

/// Read the index, every active period sheet and the target overrides.
///
/// A missing index aborts; an unreadable period sheet or target tab is
/// reported as a warning and skipped.
pub fn load_snapshot(
    source: &dyn RowSource,
    aliases: &UnitAliases,
) -> GoalsResult<ComputationOutput<Snapshot>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let index_rows = source.fetch_rows(&SheetRef::SourceIndex)?;
    let entries = parse_source_index(&index_rows);
    if entries.is_empty() {
        return Err(GoalsError::NoActiveSources);
    }

    let mut snapshot = Snapshot::default();
    for entry in &entries {
        let sheet = SheetRef::Period(entry.sheet_id.clone());
        let rows = match source.fetch_rows(&sheet) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(sheet = %sheet, error = %e, "period sheet skipped");
                let label = if entry.label.is_empty() {
                    entry.sheet_id.clone()
                } else {
                    entry.label.clone()
                };
                warnings.push(format!("Sheet for month {label} skipped: {e}"));
                snapshot.failures.push(SourceFailure {
                    label,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if rows.is_empty() {
            tracing::debug!(sheet = %sheet, "empty period sheet");
            continue;
        }

        let batch = normalize_source_rows(&rows, entry.year_month, aliases);
        if batch.undated_rows > 0 {
            warnings.push(format!(
                "{} row(s) in sheet {} have no recognised date",
                batch.undated_rows, entry.sheet_id
            ));
        }
        if batch.out_of_range_cells > 0 {
            warnings.push(format!(
                "{} numeric cell(s) in sheet {} are out of range and were read as 0",
                batch.out_of_range_cells, entry.sheet_id
            ));
        }
        snapshot.sources.push(LoadedSource {
            sheet_id: entry.sheet_id.clone(),
            year_month: batch.year_month,
            rows: batch.records.len(),
            undated_rows: batch.undated_rows,
        });
        snapshot.records.extend(batch.records);
    }

    if snapshot.sources.is_empty() {
        return Err(GoalsError::NoData(
            "no period sheet could be read".to_string(),
        ));
    }

    snapshot.overrides = match source.fetch_rows(&SheetRef::TargetIndex) {
        Ok(rows) => parse_target_overrides(&rows),
        Err(e) => {
            tracing::warn!(error = %e, "target overrides unavailable, using base targets");
            warnings.push(format!("Target overrides unavailable ({e}); base targets used"));
            Vec::new()
        }
    };

    tracing::debug!(
        sources = snapshot.sources.len(),
        records = snapshot.records.len(),
        overrides = snapshot.overrides.len(),
        "snapshot loaded"
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Spreadsheet snapshot: index → active period sheets → normalized records",
        &serde_json::json!({
            "index_rows": index_rows.len(),
            "active_sources": entries.len(),
            "loaded_sources": snapshot.sources.len(),
            "failed_sources": snapshot.failures.len(),
        }),
        warnings,
        elapsed,
        snapshot,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;

    const MARCH_ID: &str = "march2024aaaaaaaaaaaaaaa";
    const APRIL_ID: &str = "april2024aaaaaaaaaaaaaaa";

    struct FakeSource {
        tables: HashMap<SheetRef, Vec<RawRow>>,
    }

    impl RowSource for FakeSource {
        fn fetch_rows(&self, sheet: &SheetRef) -> GoalsResult<Vec<RawRow>> {
            self.tables
                .get(sheet)
                .cloned()
                .ok_or_else(|| GoalsError::SourceUnavailable {
                    source_name: sheet.to_string(),
                    reason: "429 rate limit".into(),
                })
        }
    }

    fn rows(v: serde_json::Value) -> Vec<RawRow> {
        serde_json::from_value(v).unwrap()
    }

    fn fake() -> FakeSource {
        let mut tables = HashMap::new();
        tables.insert(
            SheetRef::SourceIndex,
            rows(json!([
                { "URL": MARCH_ID, "MÊS": "03/2024", "ATIVO": "S" },
                { "URL": APRIL_ID, "MÊS": "04/2024", "ATIVO": "S" }
            ])),
        );
        tables.insert(
            SheetRef::Period(MARCH_ID.into()),
            rows(json!([
                { "empresa": "tokyo", "unidade": "chapadinha", "data": "01/03/2024", "total": 30, "revistorias": 3 }
            ])),
        );
        tables.insert(
            SheetRef::TargetIndex,
            rows(json!([
                { "MÊS": "03/2024", "EMPRESA": "TOKYO", "UNIDADE": "CHAPADINHA", "DIAS_UTEIS": 20 }
            ])),
        );
        FakeSource { tables }
    }

    #[test]
    fn test_snapshot_loads_and_reports_failures() {
        let out = load_snapshot(&fake(), &UnitAliases::default()).unwrap();
        let snap = &out.result;
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.records[0].net(), dec!(27));
        assert_eq!(snap.sources.len(), 1);
        assert_eq!(snap.failures.len(), 1);
        assert_eq!(snap.failures[0].label, "04/2024");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(snap.overrides.len(), 1);
        assert_eq!(snap.latest_token(), Some(YearMonth::new(2024, 3).unwrap()));
    }

    #[test]
    fn test_resolver_from_snapshot_uses_overrides() {
        let out = load_snapshot(&fake(), &UnitAliases::default()).unwrap();
        let resolver = out.result.resolver(TargetReference::builtin());
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(resolver.monthly_target("TOKYO", "CHAPADINHA", march), 546);
    }

    #[test]
    fn test_missing_target_tab_is_not_fatal() {
        let mut src = fake();
        src.tables.remove(&SheetRef::TargetIndex);
        let out = load_snapshot(&src, &UnitAliases::default()).unwrap();
        assert!(out.result.overrides.is_empty());
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_oversized_cells_are_reported() {
        let mut src = fake();
        src.tables.insert(
            SheetRef::Period(MARCH_ID.into()),
            rows(json!([
                { "empresa": "tokyo", "unidade": "chapadinha", "data": "01/03/2024", "total": "1e27", "qtd_152": "1e27" }
            ])),
        );
        let out = load_snapshot(&src, &UnitAliases::default()).unwrap();
        assert_eq!(out.result.records[0].gross_count, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("2 numeric cell(s)")));
    }

    #[test]
    fn test_no_active_sources_is_an_error() {
        let mut src = fake();
        src.tables.insert(
            SheetRef::SourceIndex,
            rows(json!([{ "URL": MARCH_ID, "ATIVO": "N" }])),
        );
        let err = load_snapshot(&src, &UnitAliases::default()).unwrap_err();
        assert!(matches!(err, GoalsError::NoActiveSources));
    }

    #[test]
    fn test_no_readable_sheet_is_an_error() {
        let mut src = fake();
        src.tables.remove(&SheetRef::Period(MARCH_ID.into()));
        let err = load_snapshot(&src, &UnitAliases::default()).unwrap_err();
        assert!(matches!(err, GoalsError::NoData(_)));
    }

    #[test]
    fn test_missing_index_propagates() {
        let mut src = fake();
        src.tables.remove(&SheetRef::SourceIndex);
        assert!(load_snapshot(&src, &UnitAliases::default()).is_err());
    }
}
