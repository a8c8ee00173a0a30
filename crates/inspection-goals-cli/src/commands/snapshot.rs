use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;

use inspection_goals_core::aggregation::{summarize_units, ProductionTotals};
use inspection_goals_core::config::DashboardSettings;
use inspection_goals_core::dashboard::{build_dashboard, DashboardRequest};
use inspection_goals_core::ingest::{load_snapshot, Snapshot, UnitAliases};
use inspection_goals_core::{normalize_label, ComputationOutput, YearMonth};

use super::heatmap::MetricArg;
use super::pacing::StrategyArg;
use crate::input;
use crate::input::sheets::LocalSheets;

/// Where the spreadsheet exports live and how the deployment is set up
#[derive(Args)]
pub struct SourceArgs {
    /// Index export (ARQUIVOS tab of a workbook, or a CSV/JSON table)
    #[arg(long)]
    pub index: PathBuf,

    /// Target overrides table (defaults to the METAS tab of the index workbook)
    #[arg(long)]
    pub targets: Option<PathBuf>,

    /// Directory holding `<sheet id>.<xlsx|csv|json>` period exports
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Settings file (YAML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Override the configured workdays in the month
    #[arg(long)]
    pub workdays_total: Option<u32>,

    /// Override the configured elapsed workdays
    #[arg(long)]
    pub workdays_elapsed: Option<u32>,
}

impl SourceArgs {
    fn load(&self) -> Result<(DashboardSettings, ComputationOutput<Snapshot>), Box<dyn std::error::Error>> {
        let settings = input::settings::load_settings(
            self.config.as_deref(),
            self.workdays_total,
            self.workdays_elapsed,
        )?;
        let sheets = LocalSheets::new(&self.index, self.targets.clone(), self.data_dir.clone());
        let loaded = load_snapshot(&sheets, &UnitAliases::new(&settings.unit_aliases))?;
        Ok((settings, loaded))
    }
}

/// Arguments for the per-unit production summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Restrict to one brand
    #[arg(long)]
    pub brand: Option<String>,

    /// Month as YYYY-MM or MM/YYYY (latest month with data by default)
    #[arg(long)]
    pub month: Option<YearMonth>,

    /// Restrict to a single day
    #[arg(long)]
    pub day: Option<NaiveDate>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (_, loaded) = args.source.load()?;
    let snapshot = &loaded.result;

    let month = args
        .month
        .or(args.day.map(YearMonth::of))
        .or_else(|| snapshot.months_with_data().last().copied())
        .or_else(|| snapshot.latest_token());
    let brand = args.brand.as_deref().map(normalize_label);

    let scoped: Vec<_> = snapshot
        .records
        .iter()
        .filter(|r| brand.as_ref().is_none_or(|b| r.brand == *b))
        .filter(|r| match (args.day, month, r.date) {
            (Some(day), _, date) => date == Some(day),
            (None, Some(ym), Some(date)) => ym.contains(date),
            (None, Some(_), None) => r.year_month == month,
            (None, None, _) => true,
        })
        .collect();

    let totals = ProductionTotals::from_records(scoped.iter().copied());
    let units = summarize_units(scoped.iter().copied());

    Ok(json!({
        "result": {
            "brand": brand,
            "year_month": month,
            "day": args.day,
            "records": scoped.len(),
            "gross": totals.gross,
            "reinspections": totals.reinspections,
            "net": totals.net,
            "units": units,
            "sources": snapshot.sources,
            "failures": snapshot.failures,
        },
        "methodology": "Per-unit totals over the selected brand and period",
        "warnings": loaded.warnings,
        "metadata": loaded.metadata,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    All,
    Cards,
    Units,
    Heatmap,
    Pacing,
    Ranking,
}

impl Section {
    fn key(self) -> Option<&'static str> {
        match self {
            Section::All => None,
            Section::Cards => Some("brand_cards"),
            Section::Units => Some("units"),
            Section::Heatmap => Some("heatmap"),
            Section::Pacing => Some("daily_pacing"),
            Section::Ranking => Some("ranking"),
        }
    }
}

/// Arguments for the full dashboard
#[derive(Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Brand to show (first brand in view by default)
    #[arg(long)]
    pub brand: Option<String>,

    /// Month as YYYY-MM or MM/YYYY (latest month with data by default)
    #[arg(long)]
    pub month: Option<YearMonth>,

    /// Single-day view
    #[arg(long)]
    pub day: Option<NaiveDate>,

    /// Unit for the heatmap and the day-by-day pacing table
    #[arg(long)]
    pub unit: Option<String>,

    /// Heatmap metric
    #[arg(long, value_enum, default_value = "pct")]
    pub metric: MetricArg,

    /// Day-by-day pacing strategy
    #[arg(long, value_enum, default_value = "catch-up")]
    pub strategy: StrategyArg,

    /// Print only one part of the dashboard
    #[arg(long, value_enum, default_value = "all")]
    pub section: Section,
}

pub fn run_dashboard(args: DashboardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (settings, loaded) = args.source.load()?;
    let snapshot = loaded.result;
    let resolver = snapshot.resolver(settings.target_reference());

    let request = DashboardRequest {
        brand: args.brand,
        month: args.month,
        day: args.day,
        unit: args.unit,
        heatmap_metric: args.metric.into(),
        strategy: args.strategy.into(),
    };
    let mut output = build_dashboard(&snapshot, &resolver, &settings, &request)?;

    let mut warnings = loaded.warnings;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    let mut value = serde_json::to_value(output)?;
    if let Some(key) = args.section.key() {
        let section = value
            .get("result")
            .and_then(|r| r.get(key))
            .cloned()
            .unwrap_or(Value::Null);
        value["result"] = section;
    }
    Ok(value)
}
