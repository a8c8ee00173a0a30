use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::calendar::is_workday;
use crate::error::GoalsError;
use crate::types::{with_metadata, ComputationOutput, Count, Percent};
use crate::GoalsResult;

const DEFAULT_PODIUM: usize = 5;

fn default_podium() -> usize {
    DEFAULT_PODIUM
}

// ---------------------------------------------------------------------------
// Types — Ranking
// ---------------------------------------------------------------------------

/// A unit's monthly target and the workdays it is spread over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTarget {
    pub monthly_target: i64,
    pub workdays: u32,
}

impl UnitTarget {
    pub fn daily_target(&self) -> Decimal {
        if self.workdays == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.monthly_target) / Decimal::from(self.workdays)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingInput {
    pub reference_date: NaiveDate,
    /// Unit → day → realized net, any months
    pub realized: BTreeMap<String, BTreeMap<NaiveDate, Count>>,
    /// Units without an entry have no target
    #[serde(default)]
    pub targets: BTreeMap<String, UnitTarget>,
    /// Size of the top and bottom lists
    #[serde(default = "default_podium")]
    pub podium_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUnit {
    pub unit: String,
    pub realized_net: Count,
    pub daily_target: Count,
    pub pct_today: Percent,
    /// Last workday before the reference date with a record for the unit
    pub previous_date: Option<NaiveDate>,
    pub pct_previous: Option<Percent>,
    /// Percentage points, today minus previous
    pub delta_pct: Option<Percent>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOutput {
    pub reference_date: NaiveDate,
    /// Workdays rank by % of daily target, other days by realized net
    pub workday: bool,
    pub top: Vec<RankedUnit>,
    pub bottom: Vec<RankedUnit>,
    pub ordered: Vec<RankedUnit>,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn previous_workday_point(
    series: &BTreeMap<NaiveDate, Count>,
    reference: NaiveDate,
) -> Option<(NaiveDate, Count)> {
    series
        .range(..reference)
        .rev()
        .find(|(d, _)| is_workday(**d))
        .map(|(d, v)| (*d, *v))
}

fn direction(delta: Decimal) -> Direction {
    match delta.cmp(&Decimal::ZERO) {
        Ordering::Greater => Direction::Up,
        Ordering::Less => Direction::Down,
        Ordering::Equal => Direction::Flat,
    }
}

/// Rank the units that produced on the reference date.
///
/// On a workday units are ordered by % of their daily target, otherwise by
/// realized net. Ties keep unit-name order. Each unit is compared with its
/// own last workday on record before the reference date.
pub fn rank_units(input: &RankingInput) -> GoalsResult<ComputationOutput<RankingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.podium_size == 0 {
        return Err(GoalsError::InvalidInput {
            field: "podium_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    let reference = input.reference_date;
    let workday = is_workday(reference);

    let mut ordered: Vec<RankedUnit> = Vec::new();
    for (unit, series) in &input.realized {
        let Some(&realized) = series.get(&reference) else {
            continue;
        };
        let target = input.targets.get(unit).copied().unwrap_or_default();
        if target.monthly_target == 0 {
            warnings.push(format!("Unit {unit} has no target; ranked at 0%"));
        }
        let daily_target = target.daily_target();
        let pct = |net: Decimal| net / daily_target * dec!(100);

        let pct_today = if daily_target.is_zero() {
            Decimal::ZERO
        } else {
            pct(realized)
        };
        let previous = previous_workday_point(series, reference);
        let pct_previous = previous
            .filter(|_| !daily_target.is_zero())
            .map(|(_, net)| pct(net));
        let delta_pct = pct_previous.map(|p| pct_today - p);

        ordered.push(RankedUnit {
            unit: unit.clone(),
            realized_net: realized,
            daily_target,
            pct_today,
            previous_date: previous.map(|(d, _)| d),
            pct_previous,
            delta_pct,
            direction: delta_pct.map(direction),
        });
    }

    if ordered.is_empty() {
        warnings.push(format!("No unit has data on {reference}"));
    }

    let key = |r: &RankedUnit| if workday { r.pct_today } else { r.realized_net };
    ordered.sort_by(|a, b| key(b).cmp(&key(a)));

    let n = input.podium_size.min(ordered.len());
    let top = ordered[..n].to_vec();
    let mut bottom = ordered[ordered.len() - n..].to_vec();
    bottom.sort_by(|a, b| key(a).cmp(&key(b)));

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        if workday {
            "Daily ranking by % of unit daily target"
        } else {
            "Daily ranking by realized net (non-workday)"
        },
        &serde_json::json!({
            "reference_date": reference,
            "workday": workday,
            "podium_size": input.podium_size,
            "ranked_units": ordered.len(),
        }),
        warnings,
        elapsed,
        RankingOutput {
            reference_date: reference,
            workday,
            top,
            bottom,
            ordered,
        },
    ))
}
