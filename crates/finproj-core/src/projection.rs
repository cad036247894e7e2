use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::brackets::BracketSchedule;
use crate::error::FinprojError;
use crate::fees::FeeSet;
use crate::types::*;
use crate::FinprojResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Starting state and rates for a period-by-period cost projection.
///
/// Growth rates are annual and are compounded per period, so a monthly
/// projection grows by (1 + g)^(1/12) each month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    #[serde(default)]
    pub label: String,
    /// Number of periods to simulate
    pub periods: u32,
    #[serde(default)]
    pub period_unit: PeriodUnit,
    /// Outlay counted before period 1 (down payment, closing costs)
    #[serde(default)]
    pub initial_cost: Money,
    /// Cost incurred in period 1 (e.g. rent); grows at `cost_growth`
    #[serde(default)]
    pub recurring_cost: Money,
    #[serde(default)]
    pub cost_growth: Rate,
    /// Value of the tracked asset at the start of period 1
    #[serde(default)]
    pub asset_value: Money,
    /// Appreciation (or, if negative, depreciation) of the asset
    #[serde(default)]
    pub asset_growth: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanTerms>,
    #[serde(default)]
    pub fees: FeeSet,
    /// Annual charges levied on the asset value (property tax, upkeep)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_charges: Option<BracketSchedule>,
}

/// State at the end of one simulated period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: u32,
    pub period_cost: Money,
    pub cumulative_cost: Money,
    pub asset_value: Money,
    pub outstanding_balance: Money,
    pub equity: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// Cumulative cost less equity held
    pub net_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub label: String,
    pub period_unit: PeriodUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_payment: Option<Money>,
    pub initial_cost: Money,
    pub snapshots: Vec<PeriodSnapshot>,
    pub total_cost: Money,
    pub total_interest: Money,
    pub final_asset_value: Money,
    pub final_equity: Money,
    pub final_net_cost: Money,
}

impl ProjectionResult {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Simulate `input.periods` periods and record one snapshot per period.
///
/// All inputs are validated before the first iteration; on failure no
/// partial result is produced.
pub fn run_projection(input: &ProjectionInput) -> FinprojResult<ProjectionResult> {
    validate(input)?;

    let per_year = input.period_unit.periods_per_year();
    let per_year_dec = Decimal::from(per_year);
    let asset_factor = per_period_factor(input.asset_growth, per_year)?;
    let cost_factor = per_period_factor(input.cost_growth, per_year)?;

    let (payment, periodic_rate, term, mut balance) = match &input.loan {
        Some(loan) => (
            loan.payment()?,
            loan.periodic_rate(),
            loan.term_periods,
            loan.principal,
        ),
        None => (Decimal::ZERO, Decimal::ZERO, 0, Decimal::ZERO),
    };

    let fee_base = input
        .loan
        .as_ref()
        .map(|l| l.principal)
        .unwrap_or(input.asset_value);
    let fees = input.fees.resolve(fee_base)?;
    let recurring_fees = fees.recurring_annual_total / per_year_dec;

    tracing::debug!(
        label = %input.label,
        periods = input.periods,
        unit = input.period_unit.label(),
        "running projection"
    );

    let initial_cost = input.initial_cost + fees.upfront_total;
    let mut cumulative = initial_cost;
    let mut asset = input.asset_value;
    let mut recurring = input.recurring_cost;
    let mut total_interest = Decimal::ZERO;
    let mut snapshots = Vec::with_capacity(input.periods as usize);

    for period in 1..=input.periods {
        // Loan split on the opening balance
        let (interest, principal) = if balance > Decimal::ZERO && period <= term {
            let interest = balance * periodic_rate;
            let mut principal = payment - interest;
            if principal >= balance || period == term {
                principal = balance;
            }
            (interest, principal)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        // Charges use the asset value as of the start of the period
        let charges = match &input.asset_charges {
            Some(schedule) => schedule.apply(asset)? / per_year_dec,
            None => Decimal::ZERO,
        };

        let period_cost = checked_sum(&[recurring, interest, principal, recurring_fees, charges])
            .ok_or_else(|| overflow(period))?;
        cumulative = cumulative
            .checked_add(period_cost)
            .ok_or_else(|| overflow(period))?;
        balance = (balance - principal).max(Decimal::ZERO);
        total_interest += interest;

        asset = asset.checked_mul(asset_factor).ok_or_else(|| overflow(period))?;
        recurring = recurring
            .checked_mul(cost_factor)
            .ok_or_else(|| overflow(period))?;

        let equity = asset - balance;
        snapshots.push(PeriodSnapshot {
            period,
            period_cost,
            cumulative_cost: cumulative,
            asset_value: asset,
            outstanding_balance: balance,
            equity,
            interest_paid: interest,
            principal_paid: principal,
            net_cost: cumulative - equity,
        });
    }

    let (final_asset_value, final_equity, final_net_cost) = snapshots
        .last()
        .map(|s| (s.asset_value, s.equity, s.net_cost))
        .unwrap_or((asset, asset - balance, cumulative - (asset - balance)));

    Ok(ProjectionResult {
        label: input.label.clone(),
        period_unit: input.period_unit,
        loan_payment: input.loan.as_ref().map(|_| payment),
        initial_cost,
        snapshots,
        total_cost: cumulative,
        total_interest,
        final_asset_value,
        final_equity,
        final_net_cost,
    })
}

fn validate(input: &ProjectionInput) -> FinprojResult<()> {
    if input.periods == 0 {
        return Err(FinprojError::invalid(
            "periods",
            "Projection needs at least one period",
        ));
    }
    if input.periods > MAX_PERIODS {
        return Err(FinprojError::invalid(
            "periods",
            format!("Projection is limited to {MAX_PERIODS} periods"),
        ));
    }
    ensure_non_negative("initial_cost", input.initial_cost)?;
    ensure_non_negative("recurring_cost", input.recurring_cost)?;
    ensure_non_negative("asset_value", input.asset_value)?;
    ensure_growth_rate("cost_growth", input.cost_growth)?;
    ensure_growth_rate("asset_growth", input.asset_growth)?;
    input.fees.validate()?;

    if let Some(loan) = &input.loan {
        loan.validate()?;
        if loan.period_unit != input.period_unit {
            return Err(FinprojError::invalid(
                "loan.period_unit",
                "Loan periods must match the projection periods",
            ));
        }
    }
    Ok(())
}

/// Per-period multiplier equivalent to annual growth `g`.
fn per_period_factor(annual: Rate, periods_per_year: u32) -> FinprojResult<Decimal> {
    let base = Decimal::ONE + annual;
    if periods_per_year == 1 || annual.is_zero() {
        return Ok(base);
    }
    let exponent = Decimal::ONE / Decimal::from(periods_per_year);
    base.checked_powd(exponent).ok_or_else(|| FinprojError::Overflow {
        context: "per-period growth factor".into(),
    })
}

fn checked_sum(values: &[Money]) -> Option<Money> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

fn overflow(period: u32) -> FinprojError {
    FinprojError::Overflow {
        context: format!("projection period {period}"),
    }
}
