use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::summary::ratio;
use crate::calendar::{is_workday, remaining_workdays_map};
use crate::error::GoalsError;
use crate::types::{with_metadata, ComputationOutput, Count, YearMonth};
use crate::GoalsResult;

// ---------------------------------------------------------------------------
// Types — Daily pacing
// ---------------------------------------------------------------------------

/// How each workday's target is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStrategy {
    /// Monthly target split evenly over the configured workdays
    FixedAverage,
    /// Remaining target spread over the remaining workdays, recomputed daily
    #[default]
    CatchUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    Met,
    NotMet,
    NoTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPacingInput {
    pub year_month: YearMonth,
    pub monthly_target: i64,
    /// Divisor for the constant daily target
    pub configured_workdays: u32,
    #[serde(default)]
    pub strategy: PacingStrategy,
    /// Realized net per calendar day
    pub realized: BTreeMap<NaiveDate, Count>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPacingRow {
    pub date: NaiveDate,
    pub workday: bool,
    /// Workdays left in the month counting this one; `None` on weekends
    pub remaining_workdays: Option<u32>,
    pub constant_daily_target: Count,
    pub adjusted_target: Count,
    pub realized_net: Count,
    pub delta: Count,
    pub cumulative_realized: Count,
    /// Goes negative once the month's target is exceeded
    pub remaining_to_target: Count,
    pub status: PacingStatus,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Daily target that closes the gap if every remaining workday (today
/// included) realizes it. Zero when no workday remains.
pub fn catch_up_target(target: Decimal, cumulative: Decimal, remaining: u32) -> Decimal {
    if remaining == 0 {
        return Decimal::ZERO;
    }
    (target - cumulative) / Decimal::from(remaining)
}

fn status(realized: Decimal, adjusted: Decimal) -> PacingStatus {
    if adjusted > Decimal::ZERO && realized >= adjusted {
        PacingStatus::Met
    } else if adjusted.is_zero() {
        PacingStatus::NoTarget
    } else {
        PacingStatus::NotMet
    }
}

/// Walk the realized series in date order and derive each day's target,
/// delta, running total and status.
pub fn build_daily_pacing(
    input: &DailyPacingInput,
) -> GoalsResult<ComputationOutput<Vec<DailyPacingRow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.configured_workdays > 31 {
        return Err(GoalsError::InvalidInput {
            field: "configured_workdays".into(),
            reason: format!("{} exceeds days in a month", input.configured_workdays),
        });
    }
    if input.configured_workdays == 0 {
        warnings.push("Configured workdays is zero; constant daily target is 0".into());
    }
    if input.monthly_target == 0 {
        warnings.push("Monthly target is zero; every day reports no target".into());
    }

    let outside = input
        .realized
        .keys()
        .filter(|d| !input.year_month.contains(**d))
        .count();
    if outside > 0 {
        warnings.push(format!(
            "{outside} day(s) outside {} ignored",
            input.year_month
        ));
    }

    let target = Decimal::from(input.monthly_target);
    let constant = ratio(target, Decimal::from(input.configured_workdays));
    let countdown = remaining_workdays_map(input.year_month);

    let mut cumulative = Decimal::ZERO;
    let mut rows = Vec::with_capacity(input.realized.len());
    for (&date, &realized) in input
        .realized
        .iter()
        .filter(|(d, _)| input.year_month.contains(**d))
    {
        let workday = is_workday(date);
        let remaining = countdown.get(&date).copied();
        let adjusted = match (workday, input.strategy) {
            (false, _) => Decimal::ZERO,
            (true, PacingStrategy::FixedAverage) => constant,
            (true, PacingStrategy::CatchUp) => {
                catch_up_target(target, cumulative, remaining.unwrap_or(0))
            }
        };
        cumulative += realized;
        rows.push(DailyPacingRow {
            date,
            workday,
            remaining_workdays: remaining,
            constant_daily_target: constant,
            adjusted_target: adjusted,
            realized_net: realized,
            delta: realized - adjusted,
            cumulative_realized: cumulative,
            remaining_to_target: target - cumulative,
            status: status(realized, adjusted),
        });
    }

    let methodology = match input.strategy {
        PacingStrategy::FixedAverage => "Fixed pacing: monthly target / configured workdays",
        PacingStrategy::CatchUp => {
            "Catch-up pacing: (target - realized so far) / remaining workdays incl. today"
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "year_month": input.year_month.to_string(),
            "monthly_target": input.monthly_target,
            "configured_workdays": input.configured_workdays,
            "calendar_workdays": countdown.len(),
        }),
        warnings,
        elapsed,
        rows,
    ))
}
