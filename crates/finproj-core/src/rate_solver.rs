use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::types::*;
use crate::FinprojResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_ITERATIONS: u32 = 100;
const MAX_BRACKET_STEPS: u32 = 60;
const MAX_PERIODIC_RATE: Decimal = dec!(1000);

/// Extra amount paid at the end of a given period (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicFee {
    pub period: u32,
    pub amount: Money,
}

/// Level payments at the end of each period, plus optional fee injections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStream {
    pub payment: Money,
    pub periods: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periodic_fees: Vec<PeriodicFee>,
}

impl PaymentStream {
    pub fn level(payment: Money, periods: u32) -> Self {
        PaymentStream {
            payment,
            periods,
            periodic_fees: Vec::new(),
        }
    }

    pub fn validate(&self) -> FinprojResult<()> {
        if self.periods == 0 {
            return Err(FinprojError::invalid(
                "periods",
                "Payment stream needs at least one period",
            ));
        }
        if self.periods > MAX_PERIODS {
            return Err(FinprojError::invalid(
                "periods",
                format!("Payment stream is limited to {MAX_PERIODS} periods"),
            ));
        }
        ensure_non_negative("payment", self.payment)?;
        for (i, fee) in self.periodic_fees.iter().enumerate() {
            ensure_non_negative(&format!("periodic_fees[{i}].amount"), fee.amount)?;
            if fee.period == 0 || fee.period > self.periods {
                return Err(FinprojError::invalid(
                    format!("periodic_fees[{i}].period"),
                    "Fee period must fall within the payment stream",
                ));
            }
        }
        Ok(())
    }

    /// Cash flow at the end of each period; index 0 is period 1.
    pub fn flows(&self) -> FinprojResult<Vec<Money>> {
        self.validate()?;
        let mut flows = vec![self.payment; self.periods as usize];
        for fee in &self.periodic_fees {
            let slot = &mut flows[(fee.period - 1) as usize];
            *slot = slot.checked_add(fee.amount).ok_or_else(|| overflow("periodic fees"))?;
        }
        Ok(flows)
    }

    pub fn undiscounted_total(&self) -> FinprojResult<Money> {
        self.flows()?
            .iter()
            .try_fold(Decimal::ZERO, |acc, f| acc.checked_add(*f))
            .ok_or_else(|| overflow("payment stream total"))
    }
}

fn overflow(context: &str) -> FinprojError {
    FinprojError::Overflow {
        context: context.to_string(),
    }
}

/// Solver tuning. The defaults suit loan-sized amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Absolute tolerance on |PV(rate) − net amount|
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: CONVERGENCE_THRESHOLD,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Solved periodic rate, with enough diagnostics to tell a confident
/// answer from a best-effort one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Rate per period of the payment stream
    pub rate: Rate,
    pub converged: bool,
    pub iterations: u32,
    /// PV(rate) − net amount at the returned rate
    pub residual: Money,
}

/// Find the periodic rate at which the stream's present value equals
/// `net_amount`, starting from `guess` (usually the nominal periodic rate).
pub fn estimate_effective_rate(
    net_amount: Money,
    stream: &PaymentStream,
    guess: Rate,
) -> FinprojResult<RateEstimate> {
    estimate_effective_rate_with(net_amount, stream, guess, SolverConfig::default())
}

/// Safeguarded Newton-Raphson: Newton steps while they stay inside a
/// bracket known to contain the root, bisection otherwise.
pub fn estimate_effective_rate_with(
    net_amount: Money,
    stream: &PaymentStream,
    guess: Rate,
    config: SolverConfig,
) -> FinprojResult<RateEstimate> {
    ensure_positive("net_amount", net_amount)?;
    stream.validate()?;
    if config.max_iterations == 0 {
        return Err(FinprojError::invalid(
            "max_iterations",
            "Solver needs at least one iteration",
        ));
    }

    let flows = stream.flows()?;
    let total = stream.undiscounted_total()?;
    if total < net_amount {
        return Err(FinprojError::FinancialImpossibility(format!(
            "Payments totalling {total} can never repay {net_amount} at a non-negative rate"
        )));
    }

    // PV is decreasing in the rate, so f(0) >= 0 and we look for f(hi) < 0.
    let f = |r: Rate| -> FinprojResult<(Money, Decimal)> {
        let (pv, dpv) = pv_and_derivative(r, &flows)?;
        Ok((pv - net_amount, dpv))
    };

    let (f_zero, _) = f(Decimal::ZERO)?;
    if f_zero.abs() < config.tolerance {
        return Ok(RateEstimate {
            rate: Decimal::ZERO,
            converged: true,
            iterations: 0,
            residual: f_zero,
        });
    }

    let mut lo = Decimal::ZERO;
    let mut hi = guess.max(dec!(0.01)) * dec!(2);
    let mut bracketed = false;
    for _ in 0..MAX_BRACKET_STEPS {
        let (f_hi, _) = f(hi)?;
        if f_hi < Decimal::ZERO {
            bracketed = true;
            break;
        }
        lo = hi;
        if hi >= MAX_PERIODIC_RATE {
            break;
        }
        hi = (hi * dec!(2)).min(MAX_PERIODIC_RATE);
    }
    if !bracketed {
        let (residual, _) = f(lo)?;
        tracing::warn!(rate = %lo, %residual, "effective rate could not be bracketed");
        return Ok(RateEstimate {
            rate: lo,
            converged: false,
            iterations: 0,
            residual,
        });
    }

    let mut x = guess.max(lo).min(hi);
    let mut best = (x, Decimal::MAX);

    for iteration in 1..=config.max_iterations {
        let (fx, dfx) = f(x)?;
        if fx.abs() < best.1.abs() {
            best = (x, fx);
        }
        if fx.abs() < config.tolerance {
            return Ok(RateEstimate {
                rate: x,
                converged: true,
                iterations: iteration,
                residual: fx,
            });
        }

        if fx > Decimal::ZERO {
            lo = x;
        } else {
            hi = x;
        }

        let newton = if dfx.is_zero() {
            None
        } else {
            fx.checked_div(dfx).map(|step| x - step)
        };
        x = match newton {
            Some(next) if next > lo && next < hi => next,
            _ => (lo + hi) / dec!(2),
        };
    }

    tracing::warn!(
        rate = %best.0,
        residual = %best.1,
        iterations = config.max_iterations,
        "effective rate did not converge; returning best estimate"
    );
    Ok(RateEstimate {
        rate: best.0,
        converged: false,
        iterations: config.max_iterations,
        residual: best.1,
    })
}

/// PV of end-of-period flows and its derivative with respect to the rate.
fn pv_and_derivative(rate: Rate, flows: &[Money]) -> FinprojResult<(Money, Decimal)> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(FinprojError::invalid("rate", "Rate must be greater than -100%"));
    }
    let v = Decimal::ONE / (Decimal::ONE + rate);
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    let mut dpv = Decimal::ZERO;
    for (i, cf) in flows.iter().enumerate() {
        discount *= v;
        let t = Decimal::from(i as u64 + 1);
        let discounted = cf * discount;
        pv = pv
            .checked_add(discounted)
            .ok_or_else(|| overflow("present value"))?;
        let slope = (discounted * v)
            .checked_mul(t)
            .ok_or_else(|| overflow("present value derivative"))?;
        dpv = dpv
            .checked_sub(slope)
            .ok_or_else(|| overflow("present value derivative"))?;
    }
    Ok((pv, dpv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::amortized_payment;
    use rust_decimal_macros::dec;

    #[test]
    fn test_recovers_contract_rate() {
        let payment = amortized_payment(dec!(10000), dec!(0.01), 12).unwrap();
        let stream = PaymentStream::level(payment, 12);
        let est = estimate_effective_rate(dec!(10000), &stream, dec!(0.01)).unwrap();
        assert!(est.converged);
        assert!((est.rate - dec!(0.01)).abs() < dec!(0.0000001), "got {}", est.rate);
    }

    #[test]
    fn test_upfront_fee_raises_rate() {
        let payment = amortized_payment(dec!(10000), dec!(0.01), 12).unwrap();
        let stream = PaymentStream::level(payment, 12);
        let est = estimate_effective_rate(dec!(9800), &stream, dec!(0.01)).unwrap();
        assert!(est.converged);
        assert!(est.rate > dec!(0.01) && est.rate < dec!(0.02), "got {}", est.rate);
    }

    #[test]
    fn test_single_period_undiscounted_is_zero_rate() {
        let stream = PaymentStream::level(dec!(1000), 1);
        let est = estimate_effective_rate(dec!(1000), &stream, dec!(0.05)).unwrap();
        assert!(est.converged);
        assert!(est.rate.abs() < dec!(0.0000001));
    }

    #[test]
    fn test_periodic_fees_count() {
        let mut stream = PaymentStream::level(dec!(100), 24);
        stream.periodic_fees.push(PeriodicFee {
            period: 12,
            amount: dec!(50),
        });
        assert_eq!(stream.undiscounted_total().unwrap(), dec!(2450));

        let plain = estimate_effective_rate(dec!(2000), &PaymentStream::level(dec!(100), 24), dec!(0.01))
            .unwrap();
        let with_fee = estimate_effective_rate(dec!(2000), &stream, dec!(0.01)).unwrap();
        assert!(with_fee.rate > plain.rate);
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let payment = amortized_payment(dec!(10000), dec!(0.01), 360).unwrap();
        let stream = PaymentStream::level(payment, 360);
        let config = SolverConfig {
            tolerance: dec!(0.0000001),
            max_iterations: 1,
        };
        let est = estimate_effective_rate_with(dec!(9000), &stream, dec!(0.0001), config).unwrap();
        assert!(!est.converged);
        assert_eq!(est.iterations, 1);
    }

    #[test]
    fn test_non_positive_net_rejected() {
        let stream = PaymentStream::level(dec!(100), 12);
        assert!(estimate_effective_rate(Decimal::ZERO, &stream, dec!(0.01)).is_err());
        assert!(estimate_effective_rate(dec!(-5), &stream, dec!(0.01)).is_err());
    }

    #[test]
    fn test_unrepayable_net_rejected() {
        let stream = PaymentStream::level(dec!(100), 12);
        assert!(matches!(
            estimate_effective_rate(dec!(5000), &stream, dec!(0.01)),
            Err(FinprojError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_fee_outside_stream_rejected() {
        let mut stream = PaymentStream::level(dec!(100), 12);
        stream.periodic_fees.push(PeriodicFee {
            period: 13,
            amount: dec!(10),
        });
        assert!(stream.validate().is_err());
    }

    #[test]
    fn test_fee_in_period_zero_is_invalid_not_a_panic() {
        let mut stream = PaymentStream::level(dec!(100), 12);
        stream.periodic_fees.push(PeriodicFee {
            period: 0,
            amount: dec!(10),
        });
        assert!(matches!(stream.flows(), Err(FinprojError::InvalidInput { .. })));
        assert!(stream.undiscounted_total().is_err());
    }

    #[test]
    fn test_overlong_stream_rejected() {
        let stream = PaymentStream::level(dec!(1), 4_000_000_000);
        assert!(matches!(
            estimate_effective_rate(dec!(1000), &stream, dec!(0.01)),
            Err(FinprojError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let stream = PaymentStream::level(Decimal::MAX, 2);
        assert!(matches!(
            stream.undiscounted_total(),
            Err(FinprojError::Overflow { .. })
        ));
    }
}
