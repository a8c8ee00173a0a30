use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use inspection_goals_core::aggregation::ProductionTotals;
use inspection_goals_core::pacing::{
    build_daily_pacing, compute_pacing, DailyPacingInput, PacingInput, PacingStrategy, ViewMode,
    WorkdayConfig,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Same target every workday
    Fixed,
    /// Spread the remaining target over the remaining workdays
    CatchUp,
}

impl From<StrategyArg> for PacingStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Fixed => PacingStrategy::FixedAverage,
            StrategyArg::CatchUp => PacingStrategy::CatchUp,
        }
    }
}

/// Arguments for consolidated pacing cards
#[derive(Args)]
pub struct PaceArgs {
    /// Monthly target in inspections
    #[arg(long)]
    pub monthly_target: Option<i64>,

    /// Gross inspections in the view
    #[arg(long)]
    pub gross: Option<Decimal>,

    /// Re-inspections in the view
    #[arg(long, default_value = "0")]
    pub reinspections: Decimal,

    /// Single-day view for this date; month-to-date view when omitted
    #[arg(long)]
    pub day: Option<NaiveDate>,

    /// Workdays in the month
    #[arg(long, default_value_t = 21)]
    pub workdays_total: u32,

    /// Workdays already elapsed
    #[arg(long, default_value_t = 16)]
    pub workdays_elapsed: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_pace(args: PaceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pacing_input: PacingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let gross = args.gross.ok_or("--gross is required (or provide --input)")?;
        let net = gross
            .checked_sub(args.reinspections)
            .ok_or("--gross minus --reinspections is out of range")?;
        PacingInput {
            monthly_target: args
                .monthly_target
                .ok_or("--monthly-target is required (or provide --input)")?,
            production: ProductionTotals {
                gross,
                reinspections: args.reinspections,
                net,
            },
            mode: args.day.map(ViewMode::Day).unwrap_or(ViewMode::Month),
            workdays: WorkdayConfig {
                total: args.workdays_total,
                elapsed: args.workdays_elapsed,
            },
        }
    };

    let result = compute_pacing(&pacing_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the day-by-day pacing table
#[derive(Args)]
pub struct CatchUpArgs {
    /// Path to JSON input file with the month, target and realized series
    #[arg(long)]
    pub input: Option<String>,

    /// Override the strategy given in the input
    #[arg(long)]
    pub strategy: Option<StrategyArg>,
}

pub fn run_catch_up(args: CatchUpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pacing_input: DailyPacingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("catch-up requires --input <file.json> or JSON on stdin".into());
    };
    if let Some(strategy) = args.strategy {
        pacing_input.strategy = strategy.into();
    }

    let result = build_daily_pacing(&pacing_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_goals_core::pacing::{DailyPacingRow, PacingSummary};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_pace_from_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pace.json",
            r#"{
                "monthly_target": 2000,
                "production": { "gross": "1000", "reinspections": "0", "net": "1000" },
                "mode": { "mode": "month" },
                "workdays": { "total": 20, "elapsed": 10 }
            }"#,
        );
        let value = run_pace(PaceArgs {
            monthly_target: None,
            gross: None,
            reinspections: Decimal::ZERO,
            day: None,
            workdays_total: 21,
            workdays_elapsed: 16,
            input: Some(path),
        })
        .unwrap();
        let summary: PacingSummary = serde_json::from_value(value["result"].clone()).unwrap();
        assert_eq!(summary.projection, dec!(2000));
        assert!(summary.on_track);
    }

    #[test]
    fn test_catch_up_strategy_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "month.json",
            r#"{
                "year_month": "2024-03",
                "monthly_target": 2100,
                "configured_workdays": 21,
                "realized": { "2024-03-01": "0", "2024-03-04": "0" }
            }"#,
        );
        let run = |strategy| {
            let value = run_catch_up(CatchUpArgs {
                input: Some(path.clone()),
                strategy,
            })
            .unwrap();
            serde_json::from_value::<Vec<DailyPacingRow>>(value["result"].clone()).unwrap()
        };

        let catch_up = run(None);
        assert_eq!(catch_up[1].adjusted_target, dec!(105));
        let fixed = run(Some(StrategyArg::Fixed));
        assert_eq!(fixed[1].adjusted_target, dec!(100));
    }
}
