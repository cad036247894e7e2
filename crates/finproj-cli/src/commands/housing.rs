use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finproj_core::calculators::rent_vs_buy::{self, RentVsBuyInput};

use super::{load_shareable, required};

/// Arguments for the rent vs. buy comparison
#[derive(Args)]
pub struct RentVsBuyArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Shared link query string (calculator=rent_vs_buy&...)
    #[arg(long)]
    pub query: Option<String>,

    /// Purchase price of the home
    #[arg(long)]
    pub home_price: Option<Decimal>,

    /// Down payment as a fraction of the price (0.2 = 20%)
    #[arg(long)]
    pub down_payment_rate: Option<Decimal>,

    /// Mortgage annual rate as a decimal
    #[arg(long)]
    pub mortgage_rate: Option<Decimal>,

    /// Mortgage term in years
    #[arg(long, default_value_t = 30)]
    pub mortgage_term_years: u32,

    /// Closing costs as a fraction of the price
    #[arg(long)]
    pub closing_cost_rate: Option<Decimal>,

    /// Annual property tax as a fraction of home value
    #[arg(long)]
    pub property_tax_rate: Option<Decimal>,

    /// Annual maintenance as a fraction of home value
    #[arg(long)]
    pub maintenance_rate: Option<Decimal>,

    /// Homeowner's insurance per year
    #[arg(long)]
    pub annual_insurance: Option<Decimal>,

    /// Rent for the first month
    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Annual rent increase as a decimal
    #[arg(long)]
    pub rent_growth: Option<Decimal>,

    /// Annual home price change as a decimal
    #[arg(long, allow_hyphen_values = true)]
    pub home_appreciation: Option<Decimal>,

    /// Annual return on the renter's invested savings
    #[arg(long, allow_hyphen_values = true)]
    pub investment_return: Option<Decimal>,

    /// Years to compare over
    #[arg(long)]
    pub horizon_years: Option<u32>,
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rvb_input: RentVsBuyInput =
        match load_shareable(args.input.as_deref(), args.query.as_deref())? {
            Some(input) => input,
            None => RentVsBuyInput {
                home_price: required(args.home_price, "home-price")?,
                down_payment_rate: required(args.down_payment_rate, "down-payment-rate")?,
                mortgage_rate: required(args.mortgage_rate, "mortgage-rate")?,
                mortgage_term_years: args.mortgage_term_years,
                closing_cost_rate: args.closing_cost_rate.unwrap_or_default(),
                property_tax_rate: args.property_tax_rate.unwrap_or_default(),
                maintenance_rate: args.maintenance_rate.unwrap_or_default(),
                annual_insurance: args.annual_insurance.unwrap_or_default(),
                monthly_rent: required(args.monthly_rent, "monthly-rent")?,
                rent_growth: args.rent_growth.unwrap_or_default(),
                home_appreciation: args.home_appreciation.unwrap_or_default(),
                investment_return: args.investment_return.unwrap_or_default(),
                horizon_years: required(args.horizon_years, "horizon-years")?,
            },
        };

    let result = rent_vs_buy::calculate_rent_vs_buy(&rvb_input)?;
    Ok(serde_json::to_value(result)?)
}
