use napi::Result as NapiResult;
use napi_derive::napi;
use std::collections::HashMap;

use inspection_goals_core::config::DashboardSettings;
use inspection_goals_core::dashboard::DashboardRequest;
use inspection_goals_core::ingest::{RawRow, RowSource, SheetRef, Snapshot, UnitAliases};
use inspection_goals_core::{GoalsError, GoalsResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_target(input_json: String) -> NapiResult<String> {
    let input: inspection_goals_core::targets::TargetQuery =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = inspection_goals_core::targets::resolve_target(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_pacing(input_json: String) -> NapiResult<String> {
    let input: inspection_goals_core::pacing::PacingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = inspection_goals_core::pacing::compute_pacing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_daily_pacing(input_json: String) -> NapiResult<String> {
    let input: inspection_goals_core::pacing::DailyPacingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        inspection_goals_core::pacing::build_daily_pacing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ranking & heatmap
// ---------------------------------------------------------------------------

#[napi]
pub fn rank_units(input_json: String) -> NapiResult<String> {
    let input: inspection_goals_core::ranking::RankingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = inspection_goals_core::ranking::rank_units(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_heatmap(input_json: String) -> NapiResult<String> {
    let input: inspection_goals_core::heatmap::HeatmapInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = inspection_goals_core::heatmap::build_heatmap(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ingestion & dashboard
// ---------------------------------------------------------------------------

/// Tables already fetched by the host, keyed the way the loader asks for them.
#[derive(serde::Deserialize)]
struct SheetTables {
    index: Vec<RawRow>,
    #[serde(default)]
    targets: Option<Vec<RawRow>>,
    /// Sheet id → rows
    #[serde(default)]
    periods: HashMap<String, Vec<RawRow>>,
}

impl RowSource for SheetTables {
    fn fetch_rows(&self, sheet: &SheetRef) -> GoalsResult<Vec<RawRow>> {
        let rows = match sheet {
            SheetRef::SourceIndex => Some(&self.index),
            SheetRef::TargetIndex => self.targets.as_ref(),
            SheetRef::Period(id) => self.periods.get(id),
        };
        rows.cloned().ok_or_else(|| GoalsError::SourceUnavailable {
            source_name: sheet.to_string(),
            reason: "table not supplied".into(),
        })
    }
}

#[derive(serde::Deserialize)]
struct SnapshotBindingInput {
    #[serde(flatten)]
    tables: SheetTables,
    #[serde(default)]
    settings: DashboardSettings,
}

#[napi]
pub fn load_snapshot(input_json: String) -> NapiResult<String> {
    let binding_input: SnapshotBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let aliases = UnitAliases::new(&binding_input.settings.unit_aliases);
    let output = inspection_goals_core::ingest::load_snapshot(&binding_input.tables, &aliases)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct DashboardBindingInput {
    snapshot: Snapshot,
    #[serde(default)]
    settings: DashboardSettings,
    #[serde(default)]
    request: DashboardRequest,
}

#[napi]
pub fn build_dashboard(input_json: String) -> NapiResult<String> {
    let binding_input: DashboardBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let resolver = binding_input
        .snapshot
        .resolver(binding_input.settings.target_reference());
    let output = inspection_goals_core::dashboard::build_dashboard(
        &binding_input.snapshot,
        &resolver,
        &binding_input.settings,
        &binding_input.request,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
