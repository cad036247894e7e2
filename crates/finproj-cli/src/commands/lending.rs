use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use finproj_core::calculators::apr::{self, AprInput};
use finproj_core::calculators::auto_loan::{self, AutoLoanInput};
use finproj_core::calculators::loan::{self, LoanInput};
use finproj_core::fees::{Fee, FeeAmount, FeeSet, FeeTiming};
use finproj_core::rate_solver::{estimate_effective_rate, PaymentStream, RateEstimate};
use finproj_core::time_value::effective_annual_rate;
use finproj_core::{with_metadata, LoanTerms, PeriodUnit, Rate};

use super::{load_shareable, parse_named, required};
use crate::input;

/// Arguments for the loan calculator
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Shared link query string (calculator=loan&...)
    #[arg(long)]
    pub query: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate as a decimal (0.06 = 6%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Number of repayment periods
    #[arg(long)]
    pub term: Option<u32>,

    /// Repayment period: month or year
    #[arg(long, default_value = "month", value_parser = parse_named::<PeriodUnit>)]
    pub period_unit: PeriodUnit,

    /// Additional principal paid every period
    #[arg(long)]
    pub extra_payment: Option<Decimal>,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match load_shareable(args.input.as_deref(), args.query.as_deref())? {
        Some(input) => input,
        None => LoanInput {
            principal: required(args.principal, "principal")?,
            annual_rate: required(args.annual_rate, "annual-rate")?,
            term: required(args.term, "term")?,
            period_unit: args.period_unit,
            extra_payment: args.extra_payment.unwrap_or_default(),
            start_date: args.start_date,
        },
    };

    let result = loan::calculate_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the APR calculator
#[derive(Args)]
pub struct AprArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate as a decimal
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Number of repayment periods
    #[arg(long)]
    pub term: Option<u32>,

    /// Repayment period: month or year
    #[arg(long, default_value = "month", value_parser = parse_named::<PeriodUnit>)]
    pub period_unit: PeriodUnit,

    /// Fixed fees paid at closing (origination, documentation)
    #[arg(long)]
    pub closing_fees: Option<Decimal>,

    /// Points paid at closing, as a fraction of principal (0.01 = 1 point)
    #[arg(long)]
    pub points: Option<Decimal>,

    /// Fee charged every year of the loan
    #[arg(long)]
    pub annual_fee: Option<Decimal>,
}

pub fn run_apr(args: AprArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let apr_input: AprInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => {
            let mut fees = Vec::new();
            if let Some(amount) = args.closing_fees {
                fees.push(fee("Closing fees", FeeAmount::Fixed(amount), FeeTiming::Upfront));
            }
            if let Some(rate) = args.points {
                fees.push(fee("Points", FeeAmount::Percent(rate), FeeTiming::Upfront));
            }
            if let Some(amount) = args.annual_fee {
                fees.push(fee("Annual fee", FeeAmount::Fixed(amount), FeeTiming::RecurringAnnual));
            }
            AprInput {
                loan: LoanTerms {
                    principal: required(args.principal, "principal")?,
                    annual_rate: required(args.annual_rate, "annual-rate")?,
                    term_periods: required(args.term, "term")?,
                    period_unit: args.period_unit,
                },
                fees: FeeSet::new(fees),
            }
        }
    };

    let result = apr::calculate_apr(&apr_input)?;
    Ok(serde_json::to_value(result)?)
}

fn fee(label: &str, amount: FeeAmount, timing: FeeTiming) -> Fee {
    Fee {
        label: label.to_string(),
        amount,
        timing,
    }
}

/// Arguments for the auto loan calculator
#[derive(Args)]
pub struct AutoLoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Shared link query string (calculator=auto_loan&...)
    #[arg(long)]
    pub query: Option<String>,

    /// Vehicle sticker price
    #[arg(long)]
    pub vehicle_price: Option<Decimal>,

    /// Cash paid up front
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Value of the vehicle traded in
    #[arg(long)]
    pub trade_in_value: Option<Decimal>,

    /// Sales tax rate as a decimal
    #[arg(long)]
    pub sales_tax_rate: Option<Decimal>,

    /// Dealer and registration fees rolled into the loan
    #[arg(long)]
    pub fees: Option<Decimal>,

    /// Nominal annual rate as a decimal
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Yearly loss of vehicle value as a decimal (0.15 = 15%)
    #[arg(long)]
    pub annual_depreciation: Option<Decimal>,
}

pub fn run_auto_loan(args: AutoLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let auto_input: AutoLoanInput =
        match load_shareable(args.input.as_deref(), args.query.as_deref())? {
            Some(input) => input,
            None => AutoLoanInput {
                vehicle_price: required(args.vehicle_price, "vehicle-price")?,
                down_payment: args.down_payment.unwrap_or_default(),
                trade_in_value: args.trade_in_value.unwrap_or_default(),
                sales_tax_rate: args.sales_tax_rate.unwrap_or_default(),
                fees: args.fees.unwrap_or_default(),
                annual_rate: required(args.annual_rate, "annual-rate")?,
                term_months: required(args.term_months, "term-months")?,
                annual_depreciation: args.annual_depreciation.unwrap_or_default(),
            },
        };

    let result = auto_loan::calculate_auto_loan(&auto_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Payment stream whose implied rate is wanted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveRateInput {
    /// Amount actually received at time zero
    pub net_amount: Decimal,
    #[serde(flatten)]
    pub stream: PaymentStream,
    /// Starting periodic rate for the solver
    #[serde(default)]
    pub guess: Rate,
    #[serde(default)]
    pub period_unit: PeriodUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EffectiveRateOutput {
    #[serde(flatten)]
    estimate: RateEstimate,
    /// Periodic rate × periods per year
    annual_rate: Rate,
    effective_annual_rate: Rate,
}

/// Arguments for the effective rate solver
#[derive(Args)]
pub struct EffectiveRateArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount received at time zero
    #[arg(long)]
    pub net_amount: Option<Decimal>,

    /// Level payment at the end of each period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Number of payments
    #[arg(long)]
    pub periods: Option<u32>,

    /// Starting periodic rate for the solver
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Payment period: month or year
    #[arg(long, default_value = "month", value_parser = parse_named::<PeriodUnit>)]
    pub period_unit: PeriodUnit,
}

pub fn run_effective_rate(args: EffectiveRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rate_input: EffectiveRateInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => EffectiveRateInput {
            net_amount: required(args.net_amount, "net-amount")?,
            stream: PaymentStream::level(
                required(args.payment, "payment")?,
                required(args.periods, "periods")?,
            ),
            guess: args.guess.unwrap_or_default(),
            period_unit: args.period_unit,
        },
    };

    let start = Instant::now();
    let estimate = estimate_effective_rate(rate_input.net_amount, &rate_input.stream, rate_input.guess)?;
    let ppy = rate_input.period_unit.periods_per_year();
    let mut warnings = Vec::new();
    if !estimate.converged {
        warnings.push(format!(
            "Solver did not converge after {} iterations; best estimate returned",
            estimate.iterations
        ));
    }
    let output = EffectiveRateOutput {
        annual_rate: estimate.rate * Decimal::from(ppy),
        effective_annual_rate: effective_annual_rate(estimate.rate, ppy)?,
        estimate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Safeguarded Newton-Raphson on present value of the payment stream",
        &rate_input,
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
