use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::types::*;
use crate::FinprojResult;

/// A single period in the repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Full repayment schedule for a fixed-rate loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Scheduled payment, excluding any extra principal
    pub payment: Money,
    pub period_unit: PeriodUnit,
    pub rows: Vec<AmortizationRow>,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
}

impl AmortizationSchedule {
    /// Number of payments actually made before the balance reached zero.
    pub fn payments_made(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.rows.last().and_then(|r| r.date)
    }
}

/// Build a period-by-period schedule for a fixed-payment loan.
///
/// `extra_payment` is added to principal every period and shortens the
/// schedule. `start_date` is the date of the first payment.
pub fn build_schedule(
    terms: &LoanTerms,
    extra_payment: Money,
    start_date: Option<NaiveDate>,
) -> FinprojResult<AmortizationSchedule> {
    terms.validate()?;
    ensure_non_negative("extra_payment", extra_payment)?;

    let payment = terms.payment()?;
    let rate = terms.periodic_rate();
    let months_per_period = 12 / terms.period_unit.periods_per_year();

    tracing::debug!(
        principal = %terms.principal,
        periods = terms.term_periods,
        %payment,
        "building amortization schedule"
    );

    let mut rows = Vec::with_capacity(terms.term_periods as usize);
    let mut balance = terms.principal;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for period in 1..=terms.term_periods {
        if balance <= Decimal::ZERO {
            break;
        }
        let opening = balance;
        let interest = opening * rate;

        // Final period (or an overpayment) clears the remaining balance
        let mut principal = (payment - interest)
            .checked_add(extra_payment)
            .unwrap_or(opening);
        if principal >= opening || period == terms.term_periods {
            principal = opening;
        }
        let paid = interest + principal;

        balance = (opening - principal).max(Decimal::ZERO);
        total_paid = total_paid.checked_add(paid).ok_or_else(|| FinprojError::Overflow {
            context: format!("amortization period {period}"),
        })?;
        total_interest += interest;
        total_principal += principal;

        let date = start_date
            .and_then(|d| d.checked_add_months(Months::new((period - 1) * months_per_period)));

        rows.push(AmortizationRow {
            period,
            date,
            opening_balance: opening,
            payment: paid,
            interest,
            principal,
            closing_balance: balance,
        });
    }

    Ok(AmortizationSchedule {
        payment,
        period_unit: terms.period_unit,
        rows,
        total_paid,
        total_interest,
        total_principal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn small_loan() -> LoanTerms {
        LoanTerms {
            principal: dec!(10000),
            annual_rate: dec!(0.12),
            term_periods: 12,
            period_unit: PeriodUnit::Month,
        }
    }

    #[test]
    fn test_schedule_closes_to_zero() {
        let sched = build_schedule(&small_loan(), Decimal::ZERO, None).unwrap();
        assert_eq!(sched.rows.len(), 12);
        assert_eq!(sched.rows.last().unwrap().closing_balance, Decimal::ZERO);
        assert!((sched.total_principal - dec!(10000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_payments_sum_to_n_times_payment() {
        let sched = build_schedule(&small_loan(), Decimal::ZERO, None).unwrap();
        let expected = sched.payment * dec!(12);
        assert!((sched.total_paid - expected).abs() < dec!(0.000001));
        let split = sched.total_interest + sched.total_principal;
        assert!((sched.total_paid - split).abs() < dec!(0.000001));
    }

    #[test]
    fn test_first_row_split() {
        let sched = build_schedule(&small_loan(), Decimal::ZERO, None).unwrap();
        let first = &sched.rows[0];
        // 1% of 10,000
        assert_eq!(first.interest, dec!(100));
        assert_eq!(first.principal, first.payment - dec!(100));
    }

    #[test]
    fn test_extra_payment_shortens_schedule() {
        let base = build_schedule(&small_loan(), Decimal::ZERO, None).unwrap();
        let fast = build_schedule(&small_loan(), dec!(500), None).unwrap();
        assert!(fast.payments_made() < base.payments_made());
        assert!(fast.total_interest < base.total_interest);
        assert_eq!(fast.rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let mut terms = small_loan();
        terms.annual_rate = Decimal::ZERO;
        let sched = build_schedule(&terms, Decimal::ZERO, None).unwrap();
        assert!(sched.rows.iter().all(|r| r.interest.is_zero()));
        assert!((sched.total_paid - dec!(10000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_dates_advance_monthly() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let sched = build_schedule(&small_loan(), Decimal::ZERO, Some(start)).unwrap();
        assert_eq!(sched.rows[0].date, Some(start));
        // chrono clamps to month end
        assert_eq!(sched.rows[1].date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(sched.payoff_date(), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_yearly_periods() {
        let terms = LoanTerms {
            principal: dec!(1000),
            annual_rate: dec!(0.05),
            term_periods: 5,
            period_unit: PeriodUnit::Year,
        };
        let sched = build_schedule(&terms, Decimal::ZERO, None).unwrap();
        assert_eq!(sched.rows[0].interest, dec!(50));
        assert_eq!(sched.rows.len(), 5);
    }

    #[test]
    fn test_negative_extra_payment_rejected() {
        assert!(build_schedule(&small_loan(), dec!(-1), None).is_err());
    }

    #[test]
    fn test_overlong_interest_free_term_rejected() {
        let terms = LoanTerms {
            principal: dec!(1000),
            annual_rate: Decimal::ZERO,
            term_periods: 4_000_000_000,
            period_unit: PeriodUnit::Month,
        };
        assert!(matches!(
            build_schedule(&terms, Decimal::ZERO, None),
            Err(FinprojError::InvalidInput { .. })
        ));
    }
}
