use clap::{Args, ValueEnum};
use serde_json::Value;

use inspection_goals_core::heatmap::{build_heatmap, HeatmapInput, HeatmapMetric};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    /// Percent of the daily target
    Pct,
    /// Raw net production
    Net,
}

impl From<MetricArg> for HeatmapMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Pct => HeatmapMetric::PctOfDailyTarget,
            MetricArg::Net => HeatmapMetric::Net,
        }
    }
}

/// Arguments for the calendar heatmap
#[derive(Args)]
pub struct HeatmapArgs {
    /// Path to JSON input file with the month, target and daily net series
    #[arg(long)]
    pub input: Option<String>,

    /// Override the metric given in the input
    #[arg(long)]
    pub metric: Option<MetricArg>,
}

pub fn run_heatmap(args: HeatmapArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut heatmap_input: HeatmapInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("heatmap requires --input <file.json> or JSON on stdin".into());
    };
    if let Some(metric) = args.metric {
        heatmap_input.metric = metric.into();
    }

    let result = build_heatmap(&heatmap_input)?;
    Ok(serde_json::to_value(result)?)
}
