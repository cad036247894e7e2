use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finproj_core::calculators::commission::{self, CommissionInput, CommissionStructure};

use super::required;
use crate::input;

/// Arguments for the commission calculator
#[derive(Args)]
pub struct CommissionArgs {
    /// Path to JSON/YAML input file; required for tiered structures
    #[arg(long)]
    pub input: Option<String>,

    /// Sales amount for the period
    #[arg(long)]
    pub sales: Option<Decimal>,

    /// Flat commission rate as a decimal (0.05 = 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Base salary added to total compensation
    #[arg(long)]
    pub base_salary: Option<Decimal>,

    /// Number of years to project
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual sales growth as a decimal
    #[arg(long, allow_hyphen_values = true)]
    pub sales_growth: Option<Decimal>,
}

pub fn run_commission(args: CommissionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let commission_input: CommissionInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => CommissionInput {
            sales: required(args.sales, "sales")?,
            structure: CommissionStructure::Flat {
                rate: required(args.rate, "rate")?,
            },
            base_salary: args.base_salary.unwrap_or_default(),
            projection_years: args.years.unwrap_or_default(),
            sales_growth: args.sales_growth.unwrap_or_default(),
        },
    };

    let result = commission::calculate_commission(&commission_input)?;
    Ok(serde_json::to_value(result)?)
}
