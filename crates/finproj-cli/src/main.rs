mod commands;
mod input;
mod output;
mod terminal;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::commission::CommissionArgs;
use commands::conversions::{BaseConvertArgs, UnitConvertArgs};
use commands::housing::RentVsBuyArgs;
use commands::lending::{AprArgs, AutoLoanArgs, EffectiveRateArgs, LoanArgs};
use commands::physical::{HeatIndexArgs, OhmsLawArgs};
use commands::projection::{CompareArgs, ProjectArgs};
use commands::share::ShareArgs;

/// Loan, projection and everyday calculators
#[derive(Parser)]
#[command(
    name = "finproj",
    version,
    about = "Loan, projection and everyday calculators",
    long_about = "A CLI for loan amortization, APR, rent-vs-buy and other multi-period \
                  projections with decimal precision, plus unit, number-base, heat index \
                  and Ohm's law calculators."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortized loan payment and schedule
    Loan(LoanArgs),
    /// Annual percentage rate including fees
    Apr(AprArgs),
    /// Auto loan cost and equity over time
    AutoLoan(AutoLoanArgs),
    /// Flat or tiered sales commission
    Commission(CommissionArgs),
    /// Compare renting against buying a home
    RentVsBuy(RentVsBuyArgs),
    /// Run a raw multi-period projection
    Project(ProjectArgs),
    /// Compare two projections period by period
    Compare(CompareArgs),
    /// Solve the periodic rate implied by a payment stream
    EffectiveRate(EffectiveRateArgs),
    /// Convert an integer between number bases
    BaseConvert(BaseConvertArgs),
    /// Convert length, mass, volume or temperature units
    UnitConvert(UnitConvertArgs),
    /// Apparent temperature from air temperature and humidity
    HeatIndex(HeatIndexArgs),
    /// Solve voltage, current, resistance and power from any two
    OhmsLaw(OhmsLawArgs),
    /// Encode or decode a shareable calculator link
    Share(ShareArgs),
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
    terminal::logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::lending::run_loan(args),
        Commands::Apr(args) => commands::lending::run_apr(args),
        Commands::AutoLoan(args) => commands::lending::run_auto_loan(args),
        Commands::Commission(args) => commands::commission::run_commission(args),
        Commands::RentVsBuy(args) => commands::housing::run_rent_vs_buy(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Compare(args) => commands::projection::run_compare(args),
        Commands::EffectiveRate(args) => commands::lending::run_effective_rate(args),
        Commands::BaseConvert(args) => commands::conversions::run_base_convert(args),
        Commands::UnitConvert(args) => commands::conversions::run_unit_convert(args),
        Commands::HeatIndex(args) => commands::physical::run_heat_index(args),
        Commands::OhmsLaw(args) => commands::physical::run_ohms_law(args),
        Commands::Share(args) => commands::share::run_share(args),
        Commands::Version => {
            println!("finproj {}", env!("CARGO_PKG_VERSION"));
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
