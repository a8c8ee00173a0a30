use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::aggregation::ProductionTotals;
use crate::config::WorkdayConfig;
use crate::error::GoalsError;
use crate::types::{with_metadata, ComputationOutput, Count, Percent, MAX_TOTAL_COUNT};
use crate::GoalsResult;

/// Whether a view covers a whole month or one selected day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "date", rename_all = "snake_case")]
pub enum ViewMode {
    Month,
    Day(NaiveDate),
}

impl ViewMode {
    pub fn is_day(&self) -> bool {
        matches!(self, ViewMode::Day(_))
    }
}

/// Input for a consolidated pacing card set (brand, unit or overall).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingInput {
    pub monthly_target: i64,
    pub production: ProductionTotals,
    pub mode: ViewMode,
    pub workdays: WorkdayConfig,
}

/// Goal, realized output, gap and trend for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingSummary {
    pub mode: ViewMode,
    pub monthly_target: i64,
    /// Month mode: the monthly target. Day mode: the rounded daily target.
    pub target: Count,
    /// Unrounded daily share (monthly_target / workdays.total)
    pub daily_target: Count,
    pub gross: Count,
    pub reinspections: Count,
    pub net: Count,
    /// Never negative
    pub shortfall: Count,
    pub required_per_day: Count,
    /// Realized per elapsed workday; zero in day mode
    pub daily_average: Count,
    pub projection: Count,
    pub trend_pct: Percent,
    pub on_track: bool,
}

pub(crate) fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Pacing figures without workday validation. Unit rows use it with
/// per-unit workday counts that may exceed the operator's slider range.
pub(crate) fn pacing_figures(
    monthly_target: i64,
    production: ProductionTotals,
    mode: ViewMode,
    workdays: WorkdayConfig,
) -> PacingSummary {
    let target_m = Decimal::from(monthly_target);
    let net = production.net;
    let daily_target = ratio(target_m, Decimal::from(workdays.total));

    let (target, shortfall, required_per_day, daily_average, projection, trend_pct) = match mode
    {
        ViewMode::Day(_) => {
            let rounded = daily_target.round();
            let shortfall = (rounded - net).max(Decimal::ZERO);
            let trend = ratio(net, daily_target) * dec!(100);
            (rounded, shortfall, shortfall, Decimal::ZERO, net, trend)
        }
        ViewMode::Month => {
            let shortfall = (target_m - net).max(Decimal::ZERO);
            let average = ratio(net, Decimal::from(workdays.elapsed));
            let projection = net + average * Decimal::from(workdays.remaining());
            let trend = ratio(projection, target_m) * dec!(100);
            let required = if workdays.month_closed() {
                Decimal::ZERO
            } else {
                shortfall / Decimal::from(workdays.remaining())
            };
            (target_m, shortfall, required, average, projection, trend)
        }
    };

    PacingSummary {
        mode,
        monthly_target,
        target,
        daily_target,
        gross: production.gross,
        reinspections: production.reinspections,
        net,
        shortfall,
        required_per_day,
        daily_average,
        projection,
        trend_pct,
        on_track: trend_pct >= dec!(100),
    }
}

/// Compute goal, gap, required pace, projection and trend for one scope.
///
/// Day mode measures the day's net against `monthly_target / workdays.total`
/// and projects nothing beyond the day. Month mode projects month-end output
/// from the average per elapsed workday.
pub fn compute_pacing(input: &PacingInput) -> GoalsResult<ComputationOutput<PacingSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.workdays.validate()?;

    for (field, value) in [
        ("production.gross", input.production.gross),
        ("production.reinspections", input.production.reinspections),
    ] {
        if value.abs() > MAX_TOTAL_COUNT {
            return Err(GoalsError::InvalidInput {
                field: field.into(),
                reason: format!("magnitude must not exceed {MAX_TOTAL_COUNT}"),
            });
        }
    }

    let production = if input.production.is_consistent() {
        input.production
    } else {
        let derived = ProductionTotals::new(input.production.gross, input.production.reinspections);
        warnings.push(format!(
            "Net {} replaced by gross minus re-inspections ({})",
            input.production.net, derived.net
        ));
        derived
    };

    if input.monthly_target == 0 {
        warnings.push("Monthly target is zero; trend reported as 0%".to_string());
    }
    if input.mode == ViewMode::Month && input.workdays.elapsed == 0 {
        warnings.push("No workdays elapsed; projection equals realized output".to_string());
    }
    if production.net < Decimal::ZERO {
        warnings.push(format!(
            "Net production is negative ({}): re-inspections exceed gross",
            production.net
        ));
    }

    let output = pacing_figures(input.monthly_target, production, input.mode, input.workdays);

    let methodology = match input.mode {
        ViewMode::Day(_) => "Daily pacing: net vs monthly target / configured workdays",
        ViewMode::Month => "Monthly pacing: linear projection from average per elapsed workday",
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "workdays_total": input.workdays.total,
            "workdays_elapsed": input.workdays.elapsed,
            "workdays_remaining": input.workdays.remaining(),
            "month_closed": input.workdays.month_closed(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GoalsError;

    fn totals(gross: Decimal, rev: Decimal) -> ProductionTotals {
        ProductionTotals {
            gross,
            reinspections: rev,
            net: gross - rev,
        }
    }

    fn month_input(target: i64, net: Decimal, total: u32, elapsed: u32) -> PacingInput {
        PacingInput {
            monthly_target: target,
            production: totals(net, Decimal::ZERO),
            mode: ViewMode::Month,
            workdays: WorkdayConfig { total, elapsed },
        }
    }

    #[test]
    fn test_month_projection_on_pace() {
        let out = compute_pacing(&month_input(2000, dec!(1000), 20, 10)).unwrap();
        let s = out.result;
        assert_eq!(s.daily_average, dec!(100));
        assert_eq!(s.projection, dec!(2000));
        assert_eq!(s.trend_pct, dec!(100));
        assert!(s.on_track);
        assert_eq!(s.shortfall, dec!(1000));
        assert_eq!(s.required_per_day, dec!(100));
    }

    #[test]
    fn test_month_shortfall_never_negative() {
        let s = compute_pacing(&month_input(500, dec!(800), 21, 10)).unwrap().result;
        assert_eq!(s.shortfall, Decimal::ZERO);
        assert_eq!(s.required_per_day, Decimal::ZERO);
    }

    #[test]
    fn test_month_closed_needs_nothing_per_day() {
        let s = compute_pacing(&month_input(2000, dec!(1500), 21, 21)).unwrap().result;
        assert_eq!(s.shortfall, dec!(500));
        assert_eq!(s.required_per_day, Decimal::ZERO);
        assert_eq!(s.projection, dec!(1500));
        assert_eq!(s.trend_pct, dec!(75));
    }

    #[test]
    fn test_month_without_elapsed_days() {
        let out = compute_pacing(&month_input(2100, dec!(0), 21, 0)).unwrap();
        assert_eq!(out.result.daily_average, Decimal::ZERO);
        assert_eq!(out.result.projection, Decimal::ZERO);
        assert_eq!(out.result.required_per_day, dec!(100));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_target_has_zero_trend() {
        let out = compute_pacing(&month_input(0, dec!(50), 21, 5)).unwrap();
        assert_eq!(out.result.trend_pct, Decimal::ZERO);
        assert!(!out.result.on_track);
        assert!(out.warnings.iter().any(|w| w.contains("zero")));
    }

    #[test]
    fn test_day_mode_against_daily_share() {
        let input = PacingInput {
            monthly_target: 2100,
            production: totals(dec!(90), dec!(10)),
            mode: ViewMode::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
            workdays: WorkdayConfig {
                total: 21,
                elapsed: 3,
            },
        };
        let s = compute_pacing(&input).unwrap().result;
        assert_eq!(s.target, dec!(100));
        assert_eq!(s.net, dec!(80));
        assert_eq!(s.shortfall, dec!(20));
        assert_eq!(s.required_per_day, dec!(20));
        assert_eq!(s.projection, dec!(80));
        assert_eq!(s.trend_pct, dec!(80));
    }

    #[test]
    fn test_day_mode_rounds_daily_target_for_shortfall() {
        // 1000 / 21 = 47.619 → 48
        let input = PacingInput {
            monthly_target: 1000,
            production: totals(dec!(40), dec!(0)),
            mode: ViewMode::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
            workdays: WorkdayConfig::default(),
        };
        let s = compute_pacing(&input).unwrap().result;
        assert_eq!(s.target, dec!(48));
        assert_eq!(s.shortfall, dec!(8));
    }

    #[test]
    fn test_inconsistent_net_is_rederived_with_warning() {
        let mut input = month_input(2000, dec!(100), 20, 10);
        input.production = ProductionTotals {
            gross: dec!(100),
            reinspections: dec!(10),
            net: dec!(1000),
        };
        let out = compute_pacing(&input).unwrap();
        assert_eq!(out.result.net, dec!(90));
        assert_eq!(out.result.shortfall, dec!(1910));
        assert!(!out.result.on_track);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_contradicting_net_in_json_is_rejected() {
        let parsed = serde_json::from_value::<PacingInput>(serde_json::json!({
            "monthly_target": 2000,
            "production": { "gross": "100", "reinspections": "10", "net": "1000" },
            "mode": { "mode": "month" },
            "workdays": { "total": 20, "elapsed": 10 }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_oversized_production_rejected_without_panic() {
        let huge = Decimal::from_scientific("1e27").unwrap();
        let input = PacingInput {
            monthly_target: 1,
            production: ProductionTotals::new(huge, Decimal::ZERO),
            mode: ViewMode::Month,
            workdays: WorkdayConfig { total: 20, elapsed: 10 },
        };
        let err = compute_pacing(&input).unwrap_err();
        assert!(matches!(err, GoalsError::InvalidInput { ref field, .. } if field == "production.gross"));
    }

    #[test]
    fn test_largest_accepted_totals_do_not_overflow() {
        for mode in [
            ViewMode::Month,
            ViewMode::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
        ] {
            let input = PacingInput {
                monthly_target: 1,
                production: ProductionTotals::new(MAX_TOTAL_COUNT, -MAX_TOTAL_COUNT),
                mode,
                workdays: WorkdayConfig { total: 31, elapsed: 1 },
            };
            assert!(compute_pacing(&input).unwrap().result.on_track);
        }
    }

    #[test]
    fn test_invalid_workdays_rejected() {
        let mut input = month_input(2000, dec!(1), 21, 1);
        input.workdays.total = 0;
        let err = compute_pacing(&input).unwrap_err();
        assert!(matches!(err, GoalsError::InvalidInput { .. }));
    }

    #[test]
    fn test_view_mode_serde_shape() {
        let v = serde_json::to_value(ViewMode::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()))
            .unwrap();
        assert_eq!(v, serde_json::json!({"mode": "day", "date": "2024-03-04"}));
        let m: ViewMode = serde_json::from_str(r#"{"mode": "month"}"#).unwrap();
        assert_eq!(m, ViewMode::Month);
    }
}
