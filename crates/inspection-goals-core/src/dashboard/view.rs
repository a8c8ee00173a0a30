use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::aggregation::{daily_net_series, unit_daily_net, ProductionTotals};
use crate::config::{BrandScope, DashboardSettings};
use crate::error::GoalsError;
use crate::heatmap::{build_heatmap, HeatmapCell, HeatmapInput, HeatmapMetric};
use crate::ingest::Snapshot;
use crate::pacing::{
    build_daily_pacing, compute_pacing, unit_indicators, DailyPacingInput, DailyPacingRow,
    PacingInput, PacingStrategy, PacingSummary, UnitIndicator, UnitIndicatorRequest, ViewMode,
};
use crate::ranking::{rank_units, RankingInput, RankingOutput, UnitTarget};
use crate::targets::TargetResolver;
use crate::types::{normalize_label, with_metadata, ComputationOutput, ProductionRecord, YearMonth};
use crate::GoalsResult;

// ---------------------------------------------------------------------------
// Types — Dashboard
// ---------------------------------------------------------------------------

/// What the operator selected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardRequest {
    /// Ignored when the deployment is scoped to one brand; defaults to the
    /// first brand in view
    #[serde(default)]
    pub brand: Option<String>,
    /// Defaults to the day's month, then the latest month with data
    #[serde(default)]
    pub month: Option<YearMonth>,
    /// Switches the cards and the unit table to day mode
    #[serde(default)]
    pub day: Option<NaiveDate>,
    /// Narrows the heatmap and the catch-up table to one unit
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub heatmap_metric: HeatmapMetric,
    #[serde(default)]
    pub strategy: PacingStrategy,
}

/// Everything one dashboard page shows, for one brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub year_month: YearMonth,
    pub mode: ViewMode,
    pub brand: String,
    /// Brands with records in view
    pub brands: Vec<String>,
    /// Months with dated records
    pub months: Vec<YearMonth>,
    /// Days of the selected month with records
    pub days: Vec<NaiveDate>,
    pub brand_cards: PacingSummary,
    pub units: Vec<UnitIndicator>,
    /// Only for deployments showing every brand
    pub overall_cards: Option<PacingSummary>,
    /// Brand, or the requested unit
    pub detail_scope: String,
    pub heatmap: Vec<HeatmapCell>,
    pub daily_pacing: Vec<DailyPacingRow>,
    pub ranking: Option<RankingOutput>,
}

// ---------------------------------------------------------------------------
// Selection helpers
// ---------------------------------------------------------------------------

struct Selection<'a> {
    year_month: YearMonth,
    mode: ViewMode,
    view: Vec<&'a ProductionRecord>,
}

fn select_period<'a>(
    snapshot: &'a Snapshot,
    months: &[YearMonth],
    request: &DashboardRequest,
) -> GoalsResult<Selection<'a>> {
    if months.is_empty() {
        // No recognised dates: everything is in view, month from the sources
        let year_month = request
            .month
            .or_else(|| snapshot.latest_token())
            .ok_or_else(|| GoalsError::NoData("no dated records and no month token".into()))?;
        return Ok(Selection {
            year_month,
            mode: ViewMode::Month,
            view: snapshot.records.iter().collect(),
        });
    }

    let year_month = match (request.month, request.day) {
        (Some(month), Some(day)) if !month.contains(day) => {
            return Err(GoalsError::InvalidInput {
                field: "day".into(),
                reason: format!("{day} is not in {month}"),
            });
        }
        (Some(month), _) => month,
        (None, Some(day)) => YearMonth::of(day),
        (None, None) => months[months.len() - 1],
    };

    let view = match request.day {
        Some(day) => snapshot
            .records
            .iter()
            .filter(|r| r.date == Some(day))
            .collect(),
        None => snapshot
            .records
            .iter()
            .filter(|r| r.date.is_some_and(|d| year_month.contains(d)))
            .collect(),
    };

    Ok(Selection {
        year_month,
        mode: request.day.map_or(ViewMode::Month, ViewMode::Day),
        view,
    })
}

fn select_brand(
    scope: &BrandScope,
    requested: Option<&str>,
    brands: &[String],
) -> GoalsResult<String> {
    let requested = requested.map(normalize_label).filter(|b| !b.is_empty());
    let brand = match (scope, requested) {
        (BrandScope::Brand(fixed), Some(other)) if *fixed != other => {
            return Err(GoalsError::UnknownBrand(other));
        }
        (BrandScope::Brand(fixed), _) => fixed.clone(),
        (BrandScope::All, Some(b)) => b,
        (BrandScope::All, None) => brands
            .first()
            .cloned()
            .ok_or_else(|| GoalsError::NoData("no brand has records in view".into()))?,
    };
    if brands.contains(&brand) {
        Ok(brand)
    } else {
        Err(GoalsError::UnknownBrand(brand))
    }
}

fn unit_targets(
    resolver: &TargetResolver,
    brand: &str,
    ym: YearMonth,
    units: impl Iterator<Item = String>,
) -> BTreeMap<String, UnitTarget> {
    units
        .map(|unit| {
            let target = UnitTarget {
                monthly_target: resolver.monthly_target(brand, &unit, ym),
                workdays: resolver.workdays(brand, &unit, ym),
            };
            (unit, target)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Build the full dashboard for one request over a loaded snapshot.
///
/// Brand and overall cards pace against the configured workdays; unit rows,
/// the unit-scoped catch-up table and the ranking use each unit's resolved
/// workdays. The heatmap always divides by the configured total.
pub fn build_dashboard(
    snapshot: &Snapshot,
    resolver: &TargetResolver,
    settings: &DashboardSettings,
    request: &DashboardRequest,
) -> GoalsResult<ComputationOutput<DashboardView>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    settings.validate()?;

    let months = snapshot.months_with_data();
    if months.is_empty() {
        warnings.push("No recognised report dates; showing every record".into());
    }
    let Selection {
        year_month,
        mode,
        view,
    } = select_period(snapshot, &months, request)?;

    let mut brands: Vec<String> = view.iter().map(|r| r.brand.clone()).collect();
    brands.sort();
    brands.dedup();
    if brands.is_empty() {
        return Err(GoalsError::NoData(format!("no records for {year_month}")));
    }
    let brand = select_brand(&settings.brand_scope, request.brand.as_deref(), &brands)?;
    tracing::debug!(%brand, %year_month, day_mode = mode.is_day(), records = view.len(), "dashboard selection");

    let brand_view: Vec<&ProductionRecord> =
        view.iter().copied().filter(|r| r.brand == brand).collect();
    let brand_all: Vec<&ProductionRecord> =
        snapshot.records.iter().filter(|r| r.brand == brand).collect();

    let days: Vec<NaiveDate> = daily_net_series(
        snapshot
            .records
            .iter()
            .filter(|r| r.date.is_some_and(|d| year_month.contains(d))),
    )
    .into_keys()
    .collect();

    // Cards
    let brand_cards = compute_pacing(&PacingInput {
        monthly_target: resolver.brand_monthly_target(&brand, year_month),
        production: ProductionTotals::from_records(brand_view.iter().copied()),
        mode,
        workdays: settings.workdays,
    })?;
    warnings.extend(brand_cards.warnings.into_iter().map(|w| format!("{brand}: {w}")));

    let units = unit_indicators(
        &UnitIndicatorRequest {
            brand: &brand,
            year_month,
            mode,
            workdays: settings.workdays,
            view: &brand_view,
            month: &brand_all,
        },
        resolver,
    );

    let overall_cards = match settings.brand_scope {
        BrandScope::All => {
            let out = compute_pacing(&PacingInput {
                monthly_target: resolver.overall_monthly_target(year_month),
                production: ProductionTotals::from_records(view.iter().copied()),
                mode,
                workdays: settings.workdays,
            })?;
            Some(out.result)
        }
        BrandScope::Brand(_) => None,
    };

    // Heatmap and daily pacing for the brand or one of its units
    let detail_unit = request
        .unit
        .as_deref()
        .map(normalize_label)
        .filter(|u| !u.is_empty());
    if let Some(unit) = &detail_unit {
        if !brand_all.iter().any(|r| &r.unit == unit) {
            return Err(GoalsError::InvalidInput {
                field: "unit".into(),
                reason: format!("{unit} has no records for {brand}"),
            });
        }
    }
    let (detail_scope, detail_target, detail_workdays) = match &detail_unit {
        Some(unit) => (
            unit.clone(),
            resolver.monthly_target(&brand, unit, year_month),
            resolver.workdays(&brand, unit, year_month),
        ),
        None => (
            brand.clone(),
            brand_cards.result.monthly_target,
            settings.workdays.total,
        ),
    };
    let detail_series = daily_net_series(
        brand_all
            .iter()
            .copied()
            .filter(|r| detail_unit.as_ref().map_or(true, |u| &r.unit == u))
            .filter(|r| r.date.is_some_and(|d| year_month.contains(d))),
    );

    let heatmap = build_heatmap(&HeatmapInput {
        year_month,
        monthly_target: detail_target,
        configured_workdays: settings.workdays.total,
        daily_net: detail_series.clone(),
        metric: request.heatmap_metric,
        min_pct: settings.heatmap_min_pct,
    })?;

    let daily_pacing = build_daily_pacing(&DailyPacingInput {
        year_month,
        monthly_target: detail_target,
        configured_workdays: detail_workdays,
        strategy: request.strategy,
        realized: detail_series.clone(),
    })?;
    warnings.extend(daily_pacing.warnings);

    // Ranking on the selected day, else the latest day of the series
    let rank_date = match mode {
        ViewMode::Day(day) if year_month.contains(day) => Some(day),
        _ => detail_series.keys().next_back().copied(),
    };
    let ranking = match rank_date {
        Some(reference_date) => {
            let realized = unit_daily_net(brand_all.iter().copied());
            let targets = unit_targets(resolver, &brand, year_month, realized.keys().cloned());
            let out = rank_units(&RankingInput {
                reference_date,
                realized,
                targets,
                podium_size: 5,
            })?;
            Some(out.result)
        }
        None => {
            warnings.push(format!("No data in {year_month} for a daily ranking"));
            None
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Production dashboard: brand cards, unit indicators, heatmap, catch-up, ranking",
        &serde_json::json!({
            "brand_scope": settings.brand_scope,
            "workdays": settings.workdays,
            "heatmap_min_pct": settings.heatmap_min_pct,
            "strategy": request.strategy,
        }),
        warnings,
        elapsed,
        DashboardView {
            year_month,
            mode,
            brand: brand.clone(),
            brands,
            months,
            days,
            brand_cards: brand_cards.result,
            units,
            overall_cards,
            detail_scope,
            heatmap: heatmap.result,
            daily_pacing: daily_pacing.result,
            ranking,
        },
    ))
}
