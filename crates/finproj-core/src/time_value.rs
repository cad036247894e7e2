use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinprojError;
use crate::types::{Money, Rate};
use crate::FinprojResult;

/// Fixed payment that amortizes `principal` over `periods` at `periodic_rate`.
///
/// A = P·r·(1+r)^n / ((1+r)^n − 1), or P / n for an interest-free loan.
pub fn amortized_payment(principal: Money, periodic_rate: Rate, periods: u32) -> FinprojResult<Money> {
    if periods == 0 {
        return Err(FinprojError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(FinprojError::invalid("principal", "Principal must not be negative"));
    }
    if periodic_rate < Decimal::ZERO {
        return Err(FinprojError::invalid("periodic_rate", "Rate must not be negative"));
    }

    let n = Decimal::from(periods);
    if periodic_rate.is_zero() {
        return Ok(principal / n);
    }

    let factor = growth_factor(periodic_rate, periods)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinprojError::DivisionByZero {
            context: "amortized payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(periodic_rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| FinprojError::Overflow {
            context: "amortized payment".into(),
        })
}

/// (1 + rate)^periods with overflow reported as an error.
pub fn growth_factor(rate: Rate, periods: u32) -> FinprojResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| FinprojError::Overflow {
            context: format!("growth factor over {periods} periods"),
        })
}

/// Present value of end-of-period flows; `flows[0]` falls at the end of period 1.
///
/// Discounting multiplies by v = 1/(1+r) so long horizons underflow
/// towards zero instead of overflowing.
pub fn present_value(rate: Rate, flows: &[Money]) -> FinprojResult<Money> {
    if rate <= dec!(-1) {
        return Err(FinprojError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let v = Decimal::ONE / (Decimal::ONE + rate);
    let mut discount = Decimal::ONE;
    let mut total = Decimal::ZERO;
    for (t, cf) in flows.iter().enumerate() {
        discount = discount.checked_mul(v).ok_or_else(|| FinprojError::Overflow {
            context: format!("discount factor at period {}", t + 1),
        })?;
        total += cf * discount;
    }
    Ok(total)
}

/// Annual effective rate implied by a periodic rate compounded `periods_per_year` times.
pub fn effective_annual_rate(periodic_rate: Rate, periods_per_year: u32) -> FinprojResult<Rate> {
    Ok(growth_factor(periodic_rate, periods_per_year)? - Decimal::ONE)
}
