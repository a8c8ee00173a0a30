mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::heatmap::HeatmapArgs;
use commands::pacing::{CatchUpArgs, PaceArgs};
use commands::ranking::RankingArgs;
use commands::snapshot::{DashboardArgs, SummaryArgs};
use commands::targets::TargetArgs;

/// Monthly inspection goals, pacing and rankings
#[derive(Parser)]
#[command(
    name = "igoals",
    version,
    about = "Monthly inspection goals, pacing and rankings",
    long_about = "A CLI for tracking inspection production against monthly targets \
                  with decimal precision. Resolves per-unit targets, computes pacing \
                  cards and catch-up daily targets, ranks units and renders the \
                  dashboard from local spreadsheet exports."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the monthly target of a brand or unit
    Target(TargetArgs),
    /// Consolidated pacing cards (shortfall, projection, trend)
    Pace(PaceArgs),
    /// Day-by-day catch-up pacing table for a month
    CatchUp(CatchUpArgs),
    /// Daily ranking of units against their daily targets
    Ranking(RankingArgs),
    /// Calendar heatmap of daily production
    Heatmap(HeatmapArgs),
    /// Per-unit production summary from spreadsheet exports
    Summary(SummaryArgs),
    /// Full dashboard from spreadsheet exports
    Dashboard(DashboardArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Target(args) => commands::targets::run_target(args),
        Commands::Pace(args) => commands::pacing::run_pace(args),
        Commands::CatchUp(args) => commands::pacing::run_catch_up(args),
        Commands::Ranking(args) => commands::ranking::run_ranking(args),
        Commands::Heatmap(args) => commands::heatmap::run_heatmap(args),
        Commands::Summary(args) => commands::snapshot::run_summary(args),
        Commands::Dashboard(args) => commands::snapshot::run_dashboard(args),
        Commands::Version => {
            println!("igoals {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
