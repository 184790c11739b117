mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::comparison::{
    CompareAgesArgs, CompareFeesArgs, CompareModesArgs, FeeImpactArgs, SensitivityArgs,
};
use commands::cross_strategy::{CrossoverArgs, FullComparisonArgs, WithdrawalArgs};
use commands::simulate::SimulateArgs;

/// Investment provident fund simulation and comparison
#[derive(Parser)]
#[command(
    name = "gemel",
    version,
    about = "Investment provident fund simulation and comparison",
    long_about = "A CLI for simulating long-horizon savings in an investment provident \
                  fund with decimal precision. Supports single projections, start-age, \
                  fee and withdrawal-mode comparisons, sensitivity grids, and the \
                  fund-vs-taxable-account sweep with crossover search."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single provident fund projection
    Simulate(SimulateArgs),
    /// Compare different starting ages
    CompareAges(CompareAgesArgs),
    /// Compare lump-sum vs annuity withdrawal
    CompareModes(CompareModesArgs),
    /// Compare AUM fee levels
    CompareFees(CompareFeesArgs),
    /// Fee impact table across a fee grid
    FeeImpact(FeeImpactArgs),
    /// Two-parameter sensitivity matrix
    Sensitivity(SensitivityArgs),
    /// Fund vs taxable account across starting ages
    FullComparison(FullComparisonArgs),
    /// Find the youngest starting age at which the fund wins
    Crossover(CrossoverArgs),
    /// Monthly retirement income comparison
    Withdrawal(WithdrawalArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::CompareAges(args) => commands::comparison::run_compare_ages(args),
        Commands::CompareModes(args) => commands::comparison::run_compare_modes(args),
        Commands::CompareFees(args) => commands::comparison::run_compare_fees(args),
        Commands::FeeImpact(args) => commands::comparison::run_fee_impact(args),
        Commands::Sensitivity(args) => commands::comparison::run_sensitivity(args),
        Commands::FullComparison(args) => commands::cross_strategy::run_full_comparison(args),
        Commands::Crossover(args) => commands::cross_strategy::run_crossover(args),
        Commands::Withdrawal(args) => commands::cross_strategy::run_withdrawal(args),
        Commands::Version => {
            println!("gemel {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
