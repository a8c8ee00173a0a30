use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use inspection_goals_core::ranking::{rank_units, RankingInput};

use crate::input;

/// Arguments for the daily unit ranking
#[derive(Args)]
pub struct RankingArgs {
    /// Path to JSON input file with per-unit realized series and targets
    #[arg(long)]
    pub input: Option<String>,

    /// Rank this day instead of the input's reference date
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Units shown on each podium
    #[arg(long)]
    pub podium: Option<usize>,
}

pub fn run_ranking(args: RankingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ranking_input: RankingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("ranking requires --input <file.json> or JSON on stdin".into());
    };
    if let Some(date) = args.date {
        ranking_input.reference_date = date;
    }
    if let Some(n) = args.podium {
        ranking_input.podium_size = n;
    }

    let result = rank_units(&ranking_input)?;
    Ok(serde_json::to_value(result)?)
}
