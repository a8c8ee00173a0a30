use clap::Args;
use serde_json::Value;

use inspection_goals_core::targets::{resolve_target, TargetOverride, TargetQuery};
use inspection_goals_core::YearMonth;

use crate::input;

/// Arguments for a monthly target lookup
#[derive(Args)]
pub struct TargetArgs {
    /// Brand (e.g. TOKYO, LOG, STARCHECK, VELOX)
    #[arg(long)]
    pub brand: Option<String>,

    /// Unit within the brand; the brand total is returned when omitted
    #[arg(long)]
    pub unit: Option<String>,

    /// Month as YYYY-MM or MM/YYYY
    #[arg(long)]
    pub month: Option<YearMonth>,

    /// Workdays override for the unit in that month
    #[arg(long)]
    pub workdays: Option<u32>,

    /// Explicit monthly target for the unit (wins over the base scaling)
    #[arg(long)]
    pub monthly_target: Option<i64>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_target(args: TargetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let query: TargetQuery = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let brand = args.brand.ok_or("--brand is required (or provide --input)")?;
        let year_month = args.month.ok_or("--month is required (or provide --input)")?;
        let mut overrides = Vec::new();
        if args.workdays.is_some() || args.monthly_target.is_some() {
            let unit = args
                .unit
                .clone()
                .ok_or("--workdays and --monthly-target apply to a --unit")?;
            overrides.push(TargetOverride {
                year_month,
                brand: brand.clone(),
                unit,
                workdays: args.workdays,
                monthly_target: args.monthly_target,
            });
        }
        TargetQuery {
            brand,
            unit: args.unit,
            year_month,
            overrides,
            reference: None,
        }
    };

    let result = resolve_target(&query)?;
    Ok(serde_json::to_value(result)?)
}
