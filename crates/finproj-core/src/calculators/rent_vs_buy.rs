use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::brackets::BracketSchedule;
use crate::comparison::{compare_projections, ProjectionComparison};
use crate::error::FinprojError;
use crate::fees::{Fee, FeeAmount, FeeSet, FeeTiming};
use crate::projection::{run_projection, ProjectionInput, ProjectionResult};
use crate::types::*;
use crate::FinprojResult;

/// Flat rent-vs-buy input, suitable for sharing as a query string.
/// Rates are annual fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub home_price: Money,
    pub down_payment_rate: Rate,
    pub mortgage_rate: Rate,
    pub mortgage_term_years: u32,
    #[serde(default)]
    pub closing_cost_rate: Rate,
    #[serde(default)]
    pub property_tax_rate: Rate,
    #[serde(default)]
    pub maintenance_rate: Rate,
    #[serde(default)]
    pub annual_insurance: Money,
    pub monthly_rent: Money,
    #[serde(default)]
    pub rent_growth: Rate,
    #[serde(default)]
    pub home_appreciation: Rate,
    /// Return earned on cash a renter keeps instead of buying
    #[serde(default)]
    pub investment_return: Rate,
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Buy,
    Rent,
}

/// Year-end position of both scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyYear {
    pub year: u32,
    pub buy_cumulative_cost: Money,
    pub buy_equity: Money,
    pub buy_net_cost: Money,
    pub rent_cumulative_cost: Money,
    pub rent_investment: Money,
    pub rent_net_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub down_payment: Money,
    pub closing_costs: Money,
    pub loan_amount: Money,
    pub monthly_mortgage_payment: Money,
    pub yearly: Vec<RentVsBuyYear>,
    /// Month in which buying's net cost first drops to renting's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_year: Option<u32>,
    pub cheaper: Choice,
    pub comparison: ProjectionComparison,
    pub buy: ProjectionResult,
    pub rent: ProjectionResult,
}

/// Compare buying a home on a mortgage against renting and investing the
/// cash a purchase would have tied up, month by month.
/// Mortgage term and horizon limit; the monthly runs stay within `MAX_PERIODS`.
const MAX_YEARS: u32 = MAX_PERIODS / 12;

pub fn calculate_rent_vs_buy(
    input: &RentVsBuyInput,
) -> FinprojResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let months = input.horizon_years * 12;
    let down_payment = input.home_price * input.down_payment_rate;
    let closing_costs = input
        .home_price
        .checked_mul(input.closing_cost_rate)
        .ok_or_else(|| overflow("closing costs"))?;
    let upfront = down_payment
        .checked_add(closing_costs)
        .ok_or_else(|| overflow("up-front cost"))?;
    let ownership_rate = input
        .property_tax_rate
        .checked_add(input.maintenance_rate)
        .ok_or_else(|| overflow("property tax and maintenance rate"))?;
    let loan_amount = input.home_price - down_payment;

    let loan = if loan_amount > Decimal::ZERO {
        Some(LoanTerms {
            principal: loan_amount,
            annual_rate: input.mortgage_rate,
            term_periods: input.mortgage_term_years * 12,
            period_unit: PeriodUnit::Month,
        })
    } else {
        None
    };

    let mut fees = Vec::new();
    if input.annual_insurance > Decimal::ZERO {
        fees.push(Fee {
            label: "Homeowner's insurance".into(),
            amount: FeeAmount::Fixed(input.annual_insurance),
            timing: FeeTiming::RecurringAnnual,
        });
    }

    let buy = run_projection(&ProjectionInput {
        label: "buy".into(),
        periods: months,
        period_unit: PeriodUnit::Month,
        initial_cost: upfront,
        recurring_cost: Decimal::ZERO,
        cost_growth: Decimal::ZERO,
        asset_value: input.home_price,
        asset_growth: input.home_appreciation,
        loan,
        fees: FeeSet::new(fees),
        asset_charges: Some(BracketSchedule::flat(ownership_rate)?),
    })?;

    let rent = run_projection(&ProjectionInput {
        label: "rent".into(),
        periods: months,
        period_unit: PeriodUnit::Month,
        initial_cost: upfront,
        recurring_cost: input.monthly_rent,
        cost_growth: input.rent_growth,
        asset_value: upfront,
        asset_growth: input.investment_return,
        loan: None,
        fees: FeeSet::default(),
        asset_charges: None,
    })?;

    let comparison = compare_projections(&buy, &rent)?;
    let break_even_month = comparison.break_even_period;
    let break_even_year = break_even_month.map(|m| m.div_ceil(12));
    if break_even_month.is_none() {
        warnings.push(format!(
            "Buying does not break even within {} years",
            input.horizon_years
        ));
    }
    if input.mortgage_term_years > input.horizon_years && loan_amount > Decimal::ZERO {
        warnings.push("Mortgage is still outstanding at the end of the horizon".into());
    }

    let cheaper = if comparison.net_difference <= Decimal::ZERO {
        Choice::Buy
    } else {
        Choice::Rent
    };

    let yearly = buy
        .snapshots
        .iter()
        .zip(&rent.snapshots)
        .filter(|(b, _)| b.period % 12 == 0)
        .map(|(b, r)| RentVsBuyYear {
            year: b.period / 12,
            buy_cumulative_cost: b.cumulative_cost,
            buy_equity: b.equity,
            buy_net_cost: b.net_cost,
            rent_cumulative_cost: r.cumulative_cost,
            rent_investment: r.equity,
            rent_net_cost: r.net_cost,
        })
        .collect();

    let output = RentVsBuyOutput {
        down_payment,
        closing_costs,
        loan_amount,
        monthly_mortgage_payment: buy.loan_payment.unwrap_or_default(),
        yearly,
        break_even_month,
        break_even_year,
        cheaper,
        comparison,
        buy,
        rent,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly rent vs buy projection with net-of-equity comparison",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate(input: &RentVsBuyInput) -> FinprojResult<()> {
    ensure_positive("home_price", input.home_price)?;
    ensure_non_negative("down_payment_rate", input.down_payment_rate)?;
    if input.down_payment_rate > Decimal::ONE {
        return Err(FinprojError::invalid(
            "down_payment_rate",
            "Down payment cannot exceed the home price",
        ));
    }
    ensure_non_negative("mortgage_rate", input.mortgage_rate)?;
    if input.mortgage_term_years == 0 || input.mortgage_term_years > MAX_YEARS {
        return Err(FinprojError::invalid(
            "mortgage_term_years",
            format!("Mortgage term must be between 1 and {MAX_YEARS} years"),
        ));
    }
    ensure_non_negative("closing_cost_rate", input.closing_cost_rate)?;
    ensure_non_negative("property_tax_rate", input.property_tax_rate)?;
    ensure_non_negative("maintenance_rate", input.maintenance_rate)?;
    ensure_non_negative("annual_insurance", input.annual_insurance)?;
    ensure_non_negative("monthly_rent", input.monthly_rent)?;
    ensure_growth_rate("rent_growth", input.rent_growth)?;
    ensure_growth_rate("home_appreciation", input.home_appreciation)?;
    ensure_growth_rate("investment_return", input.investment_return)?;
    if input.horizon_years == 0 || input.horizon_years > MAX_YEARS {
        return Err(FinprojError::invalid(
            "horizon_years",
            format!("Horizon must be between 1 and {MAX_YEARS} years"),
        ));
    }
    Ok(())
}

fn overflow(context: &str) -> FinprojError {
    FinprojError::Overflow {
        context: context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn sample() -> RentVsBuyInput {
        RentVsBuyInput {
            home_price: dec!(400000),
            down_payment_rate: dec!(0.20),
            mortgage_rate: dec!(0.065),
            mortgage_term_years: 30,
            closing_cost_rate: dec!(0.03),
            property_tax_rate: dec!(0.012),
            maintenance_rate: dec!(0.01),
            annual_insurance: dec!(1500),
            monthly_rent: dec!(2200),
            rent_growth: dec!(0.035),
            home_appreciation: dec!(0.04),
            investment_return: dec!(0.05),
            horizon_years: 10,
        }
    }

    #[test]
    fn test_upfront_amounts() {
        let out = calculate_rent_vs_buy(&sample()).unwrap();
        let r = &out.result;
        assert_eq!(r.down_payment, dec!(80000));
        assert_eq!(r.closing_costs, dec!(12000));
        assert_eq!(r.loan_amount, dec!(320000));
        assert!((r.monthly_mortgage_payment - dec!(2022.62)).abs() < dec!(0.01));
    }

    #[test]
    fn test_series_lengths_and_yearly_rows() {
        let out = calculate_rent_vs_buy(&sample()).unwrap();
        let r = &out.result;
        assert_eq!(r.buy.snapshots.len(), 120);
        assert_eq!(r.rent.snapshots.len(), 120);
        assert_eq!(r.yearly.len(), 10);
        assert_eq!(r.yearly[9].year, 10);
        // 30-year mortgage outlives a 10-year horizon
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_break_even_year_matches_month() {
        let out = calculate_rent_vs_buy(&sample()).unwrap();
        let r = &out.result;
        if let Some(month) = r.break_even_month {
            assert_eq!(r.break_even_year, Some((month + 11) / 12));
            let delta = r.comparison.net_deltas[(month - 1) as usize];
            assert!(delta <= Decimal::ZERO);
        }
    }

    #[test]
    fn test_expensive_rent_favours_buying() {
        let mut input = sample();
        input.monthly_rent = dec!(6000);
        let out = calculate_rent_vs_buy(&input).unwrap();
        assert_eq!(out.result.cheaper, Choice::Buy);
        assert!(out.result.break_even_month.is_some());
    }

    #[test]
    fn test_cheap_rent_favours_renting() {
        let mut input = sample();
        input.monthly_rent = dec!(500);
        input.rent_growth = Decimal::ZERO;
        input.home_appreciation = Decimal::ZERO;
        let out = calculate_rent_vs_buy(&input).unwrap();
        assert_eq!(out.result.cheaper, Choice::Rent);
        assert_eq!(out.result.break_even_month, None);
    }

    #[test]
    fn test_cash_purchase_has_no_loan() {
        let mut input = sample();
        input.down_payment_rate = Decimal::ONE;
        let out = calculate_rent_vs_buy(&input).unwrap();
        assert_eq!(out.result.loan_amount, Decimal::ZERO);
        assert_eq!(out.result.monthly_mortgage_payment, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_horizon_rejected() {
        let mut input = sample();
        input.horizon_years = 0;
        assert!(calculate_rent_vs_buy(&input).is_err());
    }

    #[test]
    fn test_overlong_mortgage_term_rejected() {
        let mut input = sample();
        input.mortgage_term_years = 400_000_000;
        let err = calculate_rent_vs_buy(&input).unwrap_err();
        assert!(matches!(err, FinprojError::InvalidInput { .. }));
    }

    #[test]
    fn test_huge_closing_costs_are_overflow() {
        let mut input = sample();
        input.home_price = Decimal::MAX / dec!(2);
        input.closing_cost_rate = dec!(10);
        let err = calculate_rent_vs_buy(&input).unwrap_err();
        assert!(matches!(err, FinprojError::Overflow { .. }));
    }
}
