use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::fees::{FeeSet, ResolvedFee};
use crate::rate_solver::{estimate_effective_rate, PaymentStream, PeriodicFee};
use crate::time_value::effective_annual_rate;
use crate::types::*;
use crate::FinprojResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AprInput {
    pub loan: LoanTerms,
    #[serde(default)]
    pub fees: FeeSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    pub payment: Money,
    /// Principal less up-front fees: what the borrower actually receives
    pub net_amount: Money,
    pub fees: Vec<ResolvedFee>,
    pub upfront_fees: Money,
    pub recurring_annual_fees: Money,
    pub total_fees: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    pub nominal_rate: Rate,
    pub periodic_rate: Rate,
    /// Periodic rate × periods per year
    pub apr: Rate,
    pub effective_annual_rate: Rate,
    pub converged: bool,
    pub iterations: u32,
}

/// True APR of a loan once its fees are taken into account.
pub fn calculate_apr(input: &AprInput) -> FinprojResult<ComputationOutput<AprOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan = &input.loan;
    let payment = loan.payment()?;
    let fees = input.fees.resolve(loan.principal)?;

    let net_amount = loan.principal - fees.upfront_total;
    if net_amount <= Decimal::ZERO {
        return Err(FinprojError::invalid(
            "fees",
            "Up-front fees consume the entire principal",
        ));
    }

    let per_year = loan.period_unit.periods_per_year();
    let periodic_fees: Vec<PeriodicFee> = if fees.recurring_annual_total.is_zero() {
        Vec::new()
    } else {
        (1..=loan.term_periods)
            .filter(|p| p % per_year == 0)
            .map(|period| PeriodicFee {
                period,
                amount: fees.recurring_annual_total,
            })
            .collect()
    };
    let recurring_paid = fees.recurring_annual_total * Decimal::from(periodic_fees.len() as u64);

    let stream = PaymentStream {
        payment,
        periods: loan.term_periods,
        periodic_fees,
    };
    let estimate = estimate_effective_rate(net_amount, &stream, loan.periodic_rate())?;
    if !estimate.converged {
        warnings.push(format!(
            "APR solver stopped after {} iterations without converging; result is approximate (residual {})",
            estimate.iterations, estimate.residual
        ));
    }

    let total_payments = payment * Decimal::from(loan.term_periods);
    let output = AprOutput {
        payment,
        net_amount,
        fees: fees.items.clone(),
        upfront_fees: fees.upfront_total,
        recurring_annual_fees: fees.recurring_annual_total,
        total_fees: fees.upfront_total + recurring_paid,
        total_payments,
        total_interest: total_payments - loan.principal,
        nominal_rate: loan.annual_rate,
        periodic_rate: estimate.rate,
        apr: estimate.rate * Decimal::from(per_year),
        effective_annual_rate: effective_annual_rate(estimate.rate, per_year)?,
        converged: estimate.converged,
        iterations: estimate.iterations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "APR via safeguarded Newton-Raphson on the fee-adjusted payment stream",
        &serde_json::json!({
            "principal": loan.principal.to_string(),
            "annual_rate": loan.annual_rate.to_string(),
            "term_periods": loan.term_periods,
            "period_unit": loan.period_unit.label(),
            "fee_count": input.fees.fees.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
