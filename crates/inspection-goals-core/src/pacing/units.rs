use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::summary::{pacing_figures, ratio, PacingSummary, ViewMode};
use crate::aggregation::{
    month_to_date_net_by_unit, summarize_units, Badge, ProductionTotals, UnitSummary,
};
use crate::config::WorkdayConfig;
use crate::targets::TargetResolver;
use crate::types::{Count, Percent, Price, ProductionRecord, YearMonth};

/// Records and settings for one brand's unit table.
pub struct UnitIndicatorRequest<'a> {
    pub brand: &'a str,
    pub year_month: YearMonth,
    pub mode: ViewMode,
    pub workdays: WorkdayConfig,
    /// Records in view: the selected day, or the whole month
    pub view: &'a [&'a ProductionRecord],
    /// The brand's records for the whole month, for month-to-date figures
    pub month: &'a [&'a ProductionRecord],
}

/// One row of the per-unit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitIndicator {
    pub unit: String,
    pub monthly_target: i64,
    pub workdays: u32,
    /// Month mode: monthly target. Day mode: the unit's rounded daily target.
    pub target: Count,
    pub gross: Count,
    pub reinspections: Count,
    pub net: Count,
    pub shortfall: Count,
    pub required_per_day: Count,
    pub projection: Count,
    pub trend_pct: Percent,
    pub on_track: bool,
    pub ticket: Option<Price>,
    pub ticket_badge: Option<Badge>,
    pub pct_190: Percent,
    pub pct_190_badge: Badge,
}

fn row(
    summary: UnitSummary,
    monthly_target: i64,
    workdays: u32,
    pacing: PacingSummary,
) -> UnitIndicator {
    UnitIndicator {
        unit: summary.unit,
        monthly_target,
        workdays,
        target: pacing.target,
        gross: summary.gross,
        reinspections: summary.reinspections,
        net: summary.net,
        shortfall: pacing.shortfall,
        required_per_day: pacing.required_per_day,
        projection: pacing.projection,
        trend_pct: pacing.trend_pct,
        on_track: pacing.on_track,
        ticket: summary.ticket,
        ticket_badge: summary.ticket_badge,
        pct_190: summary.pct_190,
        pct_190_badge: summary.pct_190_badge,
    }
}

/// Aggregator summary plus pacing for every unit with records in view.
///
/// Every row reports the unit's resolved workdays. Month mode paces each unit
/// against the view's workday config. Day mode
/// takes the unit's daily target from its own resolved workdays and projects
/// month-end output from the unit's month-to-date net.
pub fn unit_indicators(
    req: &UnitIndicatorRequest<'_>,
    resolver: &TargetResolver,
) -> Vec<UnitIndicator> {
    let mtd = match req.mode {
        ViewMode::Day(day) => month_to_date_net_by_unit(req.month.iter().copied(), day),
        ViewMode::Month => Default::default(),
    };

    summarize_units(req.view.iter().copied())
        .into_iter()
        .map(|summary| {
            let monthly = resolver.monthly_target(req.brand, &summary.unit, req.year_month);
            let unit_workdays = resolver.workdays(req.brand, &summary.unit, req.year_month);
            let totals = ProductionTotals {
                gross: summary.gross,
                reinspections: summary.reinspections,
                net: summary.net,
            };
            match req.mode {
                ViewMode::Month => {
                    let pacing = pacing_figures(monthly, totals, req.mode, req.workdays);
                    row(summary, monthly, unit_workdays, pacing)
                }
                ViewMode::Day(_) => {
                    let config = WorkdayConfig {
                        total: unit_workdays,
                        elapsed: req.workdays.elapsed,
                    };
                    let mut pacing = pacing_figures(monthly, totals, req.mode, config);
                    let to_date = mtd.get(&summary.unit).copied().unwrap_or(summary.net);
                    let average = ratio(to_date, Decimal::from(req.workdays.elapsed));
                    pacing.projection =
                        (to_date + average * Decimal::from(req.workdays.remaining())).round();
                    row(summary, monthly, unit_workdays, pacing)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{TargetOverride, TargetReference};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rec(unit: &str, day: u32, gross: Decimal) -> ProductionRecord {
        ProductionRecord {
            brand: "TOKYO".into(),
            unit: unit.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day),
            gross_count: gross,
            qty_at_price_152: dec!(1),
            qty_at_price_190: dec!(1),
            pct_at_or_above_190: dec!(30),
            ..Default::default()
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn test_month_mode_rows() {
        let records = vec![rec("CHAPADINHA", 1, dec!(300)), rec("CHAPADINHA", 4, dec!(100))];
        let view: Vec<&ProductionRecord> = records.iter().collect();
        let resolver = TargetResolver::new(TargetReference::builtin(), []);
        let req = UnitIndicatorRequest {
            brand: "TOKYO",
            year_month: march(),
            mode: ViewMode::Month,
            workdays: WorkdayConfig { total: 21, elapsed: 2 },
            view: &view,
            month: &view,
        };
        let rows = unit_indicators(&req, &resolver);
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.monthly_target, 573);
        assert_eq!(r.net, dec!(400));
        assert_eq!(r.shortfall, dec!(173));
        // 400 + 200 * 19
        assert_eq!(r.projection, dec!(4200));
        assert!(r.on_track);
        assert_eq!(r.ticket, Some(dec!(171)));
        assert_eq!(r.pct_190_badge, Badge::Pass);
    }

    #[test]
    fn test_month_mode_reports_unit_workdays() {
        let records = vec![rec("CHAPADINHA", 1, dec!(300)), rec("SANTA INÊS", 1, dec!(100))];
        let view: Vec<&ProductionRecord> = records.iter().collect();
        let resolver = TargetResolver::new(
            TargetReference::builtin(),
            [TargetOverride {
                year_month: march(),
                brand: "TOKYO".into(),
                unit: "CHAPADINHA".into(),
                workdays: Some(20),
                monthly_target: None,
            }],
        );
        let req = UnitIndicatorRequest {
            brand: "TOKYO",
            year_month: march(),
            mode: ViewMode::Month,
            workdays: WorkdayConfig { total: 22, elapsed: 2 },
            view: &view,
            month: &view,
        };
        let rows = unit_indicators(&req, &resolver);
        assert_eq!(rows[0].unit, "CHAPADINHA");
        assert_eq!(rows[0].workdays, 20);
        assert_eq!(rows[0].monthly_target, 546);
        assert_eq!(rows[1].workdays, 21);
    }

    #[test]
    fn test_day_mode_uses_unit_workdays_and_month_to_date() {
        let records = vec![rec("CHAPADINHA", 1, dec!(20)), rec("CHAPADINHA", 4, dec!(30))];
        let month: Vec<&ProductionRecord> = records.iter().collect();
        let view: Vec<&ProductionRecord> = vec![&records[1]];
        let resolver = TargetResolver::new(
            TargetReference::builtin(),
            [TargetOverride {
                year_month: march(),
                brand: "TOKYO".into(),
                unit: "CHAPADINHA".into(),
                workdays: Some(20),
                monthly_target: None,
            }],
        );
        let req = UnitIndicatorRequest {
            brand: "TOKYO",
            year_month: march(),
            mode: ViewMode::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
            workdays: WorkdayConfig { total: 21, elapsed: 2 },
            view: &view,
            month: &month,
        };
        let rows = unit_indicators(&req, &resolver);
        let r = &rows[0];
        assert_eq!(r.monthly_target, 546);
        assert_eq!(r.workdays, 20);
        // 546 / 20 = 27.3 → 27
        assert_eq!(r.target, dec!(27));
        assert_eq!(r.net, dec!(30));
        assert_eq!(r.shortfall, dec!(0));
        // mtd 50, 25/day, 19 remaining → 525
        assert_eq!(r.projection, dec!(525));
    }
}
