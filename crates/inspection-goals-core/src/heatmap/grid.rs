use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::calendar::{days_in_month, month_bounds};
use crate::error::GoalsError;
use crate::types::{with_metadata, ComputationOutput, Count, Percent, YearMonth};
use crate::GoalsResult;

/// Upper bound of the colour scale, in percent of the daily target.
pub const HEATMAP_MAX_PCT: u32 = 120;

fn default_min_pct() -> u32 {
    60
}

/// What a cell's `value` carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    /// % of the constant daily target, weekdays only
    #[default]
    PctOfDailyTarget,
    Net,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapInput {
    pub year_month: YearMonth,
    pub monthly_target: i64,
    /// Divisor for the daily target; the operator's configured total
    pub configured_workdays: u32,
    pub daily_net: BTreeMap<NaiveDate, Count>,
    #[serde(default)]
    pub metric: HeatmapMetric,
    #[serde(default = "default_min_pct")]
    pub min_pct: u32,
}

/// One calendar day laid out on a Monday-first week grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub day: u32,
    /// 0 = Monday
    pub weekday: u32,
    /// Row of the week grid, 0 for the week holding the 1st
    pub week_index: u32,
    pub net: Option<Count>,
    pub pct_of_daily_target: Option<Percent>,
    pub value: Option<Decimal>,
}

/// Lay out one month as calendar cells coloured by net or % of daily target.
///
/// Days after the last day with data, and days without data, carry no net.
pub fn build_heatmap(input: &HeatmapInput) -> GoalsResult<ComputationOutput<Vec<HeatmapCell>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.min_pct >= HEATMAP_MAX_PCT {
        return Err(GoalsError::InvalidInput {
            field: "min_pct".into(),
            reason: format!("must be below {HEATMAP_MAX_PCT}"),
        });
    }

    let ym = input.year_month;
    let month_net: BTreeMap<NaiveDate, Count> = input
        .daily_net
        .iter()
        .filter(|(d, _)| ym.contains(**d))
        .map(|(d, v)| (*d, *v))
        .collect();
    let last_data_day = month_net.keys().next_back().copied();
    if last_data_day.is_none() {
        warnings.push(format!("No data for {ym}; every cell is empty"));
    }

    let daily_target = if input.configured_workdays == 0 {
        warnings.push("Configured workdays is zero; % of daily target unavailable".into());
        Decimal::ZERO
    } else {
        Decimal::from(input.monthly_target) / Decimal::from(input.configured_workdays)
    };

    let (first, _) = month_bounds(ym);
    let first_weekday = first.weekday().num_days_from_monday();

    let cells: Vec<HeatmapCell> = days_in_month(ym)
        .into_iter()
        .map(|date| {
            let day = date.day();
            let weekday = date.weekday().num_days_from_monday();
            let net = match last_data_day {
                Some(last) if date <= last => month_net.get(&date).copied(),
                _ => None,
            };
            let pct = net
                .filter(|_| !daily_target.is_zero())
                .map(|n| n / daily_target * dec!(100));
            let value = match input.metric {
                HeatmapMetric::PctOfDailyTarget => pct.filter(|_| weekday < 5),
                HeatmapMetric::Net => net,
            };
            HeatmapCell {
                date,
                day,
                weekday,
                week_index: (day + first_weekday - 1) / 7,
                net,
                pct_of_daily_target: pct,
                value,
            }
        })
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Monthly calendar heatmap (Monday-first weeks)",
        &serde_json::json!({
            "year_month": ym.to_string(),
            "metric": input.metric,
            "daily_target": daily_target.to_string(),
            "scale_min_pct": input.min_pct,
            "scale_max_pct": HEATMAP_MAX_PCT,
            "last_data_day": last_data_day,
        }),
        warnings,
        elapsed,
        cells,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn input(metric: HeatmapMetric) -> HeatmapInput {
        HeatmapInput {
            year_month: YearMonth::new(2024, 3).unwrap(),
            monthly_target: 2100,
            configured_workdays: 21,
            daily_net: BTreeMap::from([(d(1), dec!(100)), (d(2), dec!(30)), (d(5), dec!(90))]),
            metric,
            min_pct: 60,
        }
    }

    #[test]
    fn test_grid_layout() {
        // March 2024 starts on a Friday
        let cells = build_heatmap(&input(HeatmapMetric::Net)).unwrap().result;
        assert_eq!(cells.len(), 31);
        assert_eq!(cells[0].weekday, 4);
        assert_eq!(cells[0].week_index, 0);
        assert_eq!(cells[2].weekday, 6);
        assert_eq!(cells[2].week_index, 0);
        // Monday the 4th starts the second row
        assert_eq!(cells[3].week_index, 1);
        assert_eq!(cells[30].week_index, 4);
    }

    #[test]
    fn test_cells_after_last_data_day_are_empty() {
        let cells = build_heatmap(&input(HeatmapMetric::Net)).unwrap().result;
        assert_eq!(cells[0].net, Some(dec!(100)));
        assert_eq!(cells[3].net, None);
        assert_eq!(cells[4].net, Some(dec!(90)));
        assert!(cells[5..].iter().all(|c| c.net.is_none()));
    }

    #[test]
    fn test_pct_metric_blank_on_weekends() {
        let cells = build_heatmap(&input(HeatmapMetric::PctOfDailyTarget))
            .unwrap()
            .result;
        assert_eq!(cells[0].value, Some(dec!(100)));
        assert_eq!(cells[1].pct_of_daily_target, Some(dec!(30)));
        assert_eq!(cells[1].value, None);
        assert_eq!(cells[4].value, Some(dec!(90)));
    }

    #[test]
    fn test_zero_workdays_has_no_pct() {
        let mut inp = input(HeatmapMetric::PctOfDailyTarget);
        inp.configured_workdays = 0;
        let out = build_heatmap(&inp).unwrap();
        assert!(out.result.iter().all(|c| c.pct_of_daily_target.is_none()));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_scale_floor_must_be_below_ceiling() {
        let mut inp = input(HeatmapMetric::Net);
        inp.min_pct = 120;
        assert!(build_heatmap(&inp).is_err());
    }
}
