use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{build_schedule, AmortizationSchedule};
use crate::types::*;
use crate::FinprojResult;

/// Flat loan calculator input, suitable for sharing as a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Nominal annual rate (0.06 = 6%)
    pub annual_rate: Rate,
    /// Number of repayment periods
    pub term: u32,
    #[serde(default)]
    pub period_unit: PeriodUnit,
    /// Additional principal paid every period
    #[serde(default)]
    pub extra_payment: Money,
    /// Date of the first payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl LoanInput {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.principal,
            annual_rate: self.annual_rate,
            term_periods: self.term,
            period_unit: self.period_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub payment: Money,
    pub payments_made: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    /// Interest avoided by the extra payment
    pub interest_saved: Money,
    /// Periods removed from the term by the extra payment
    pub periods_saved: u32,
    pub schedule: AmortizationSchedule,
}

/// Payment, totals and full amortization schedule for a fixed-rate loan.
pub fn calculate_loan(input: &LoanInput) -> FinprojResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = input.terms();
    terms.validate()?;
    ensure_non_negative("extra_payment", input.extra_payment)?;

    if terms.annual_rate.is_zero() {
        warnings.push("Interest-free loan: payment is principal divided by term".into());
    }

    let schedule = build_schedule(&terms, input.extra_payment, input.start_date)?;
    let (interest_saved, periods_saved) = if input.extra_payment > Decimal::ZERO {
        let base = build_schedule(&terms, Decimal::ZERO, None)?;
        (
            base.total_interest - schedule.total_interest,
            base.payments_made() - schedule.payments_made(),
        )
    } else {
        (Decimal::ZERO, 0)
    };

    let output = LoanOutput {
        payment: schedule.payment,
        payments_made: schedule.payments_made(),
        total_paid: schedule.total_paid,
        total_interest: schedule.total_interest,
        payoff_date: schedule.payoff_date(),
        interest_saved,
        periods_saved,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortization",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "term": input.term,
            "period_unit": input.period_unit.label(),
            "extra_payment": input.extra_payment.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mortgage() -> LoanInput {
        LoanInput {
            principal: dec!(200000),
            annual_rate: dec!(0.06),
            term: 360,
            period_unit: PeriodUnit::Month,
            extra_payment: Decimal::ZERO,
            start_date: None,
        }
    }

    #[test]
    fn test_thirty_year_mortgage() {
        let out = calculate_loan(&mortgage()).unwrap();
        let r = &out.result;
        assert!((r.payment - dec!(1199.10)).abs() < dec!(0.01));
        assert_eq!(r.payments_made, 360);
        // ~231,676 of interest over the life of the loan
        assert!((r.total_interest - dec!(231676.38)).abs() < dec!(1));
        assert_eq!(r.interest_saved, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_savings() {
        let mut input = mortgage();
        input.extra_payment = dec!(200);
        let out = calculate_loan(&input).unwrap();
        assert!(out.result.interest_saved > dec!(50000));
        assert!(out.result.periods_saved > 60);
    }

    #[test]
    fn test_zero_rate_warns() {
        let mut input = mortgage();
        input.annual_rate = Decimal::ZERO;
        input.term = 100;
        let out = calculate_loan(&input).unwrap();
        assert_eq!(out.result.payment, dec!(2000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_payoff_date() {
        let mut input = mortgage();
        input.term = 12;
        input.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let out = calculate_loan(&input).unwrap();
        assert_eq!(out.result.payoff_date, NaiveDate::from_ymd_opt(2026, 2, 1));
    }

    #[test]
    fn test_zero_term_rejected() {
        let mut input = mortgage();
        input.term = 0;
        assert!(calculate_loan(&input).is_err());
    }
}
