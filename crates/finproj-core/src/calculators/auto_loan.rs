use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::fees::FeeSet;
use crate::projection::{run_projection, ProjectionInput, ProjectionResult};
use crate::types::*;
use crate::FinprojResult;

/// Flat auto loan input, suitable for sharing as a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLoanInput {
    pub vehicle_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub trade_in_value: Money,
    /// Applied to price less trade-in
    #[serde(default)]
    pub sales_tax_rate: Rate,
    /// Dealer and registration fees rolled into the loan
    #[serde(default)]
    pub fees: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    /// Fraction of value lost per year (0.15 = 15%)
    #[serde(default)]
    pub annual_depreciation: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoLoanOutput {
    pub sales_tax: Money,
    pub amount_financed: Money,
    pub monthly_payment: Money,
    pub total_of_payments: Money,
    pub total_interest: Money,
    /// Down payment + trade-in + all loan payments
    pub total_cost: Money,
    /// First month in which the vehicle is worth more than the balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_positive_equity_month: Option<u32>,
    pub projection: ProjectionResult,
}

pub fn calculate_auto_loan(
    input: &AutoLoanInput,
) -> FinprojResult<ComputationOutput<AutoLoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_positive("vehicle_price", input.vehicle_price)?;
    ensure_non_negative("down_payment", input.down_payment)?;
    ensure_non_negative("trade_in_value", input.trade_in_value)?;
    ensure_non_negative("sales_tax_rate", input.sales_tax_rate)?;
    ensure_non_negative("fees", input.fees)?;
    ensure_non_negative("annual_depreciation", input.annual_depreciation)?;
    if input.annual_depreciation >= Decimal::ONE {
        return Err(FinprojError::invalid(
            "annual_depreciation",
            "Depreciation must be below 100% per year",
        ));
    }

    let taxable = (input.vehicle_price - input.trade_in_value).max(Decimal::ZERO);
    let sales_tax = taxable * input.sales_tax_rate;
    let amount_financed = input.vehicle_price + sales_tax + input.fees
        - input.down_payment
        - input.trade_in_value;
    if amount_financed <= Decimal::ZERO {
        return Err(FinprojError::invalid(
            "down_payment",
            "Down payment and trade-in already cover the purchase",
        ));
    }

    let loan = LoanTerms {
        principal: amount_financed,
        annual_rate: input.annual_rate,
        term_periods: input.term_months,
        period_unit: PeriodUnit::Month,
    };
    let projection = run_projection(&ProjectionInput {
        label: "auto loan".into(),
        periods: input.term_months,
        period_unit: PeriodUnit::Month,
        initial_cost: input.down_payment + input.trade_in_value,
        recurring_cost: Decimal::ZERO,
        cost_growth: Decimal::ZERO,
        asset_value: input.vehicle_price,
        asset_growth: -input.annual_depreciation,
        loan: Some(loan),
        fees: FeeSet::default(),
        asset_charges: None,
    })?;

    let monthly_payment = projection.loan_payment.unwrap_or_default();
    let total_of_payments: Money = projection
        .snapshots
        .iter()
        .map(|s| s.interest_paid + s.principal_paid)
        .sum();

    let first_positive_equity_month = projection
        .snapshots
        .iter()
        .find(|s| s.equity > Decimal::ZERO)
        .map(|s| s.period);
    match first_positive_equity_month {
        Some(month) if month > 1 => warnings.push(format!(
            "Loan balance exceeds vehicle value until month {month}"
        )),
        None => warnings.push("Vehicle value never exceeds the loan balance".into()),
        _ => {}
    }

    let output = AutoLoanOutput {
        sales_tax,
        amount_financed,
        monthly_payment,
        total_of_payments,
        total_interest: projection.total_interest,
        total_cost: input.down_payment + input.trade_in_value + total_of_payments,
        first_positive_equity_month,
        projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Auto loan amortization with monthly depreciation",
        &serde_json::json!({
            "vehicle_price": input.vehicle_price.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "term_months": input.term_months,
            "annual_depreciation": input.annual_depreciation.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
