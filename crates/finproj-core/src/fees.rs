use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::types::*;
use crate::FinprojResult;

/// How a fee's amount is expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeAmount {
    Fixed(Money),
    /// Fraction of the loan principal (0.01 = 1 point)
    Percent(Rate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTiming {
    /// Deducted from the amount received at origination
    Upfront,
    /// Charged once per year for the life of the loan
    RecurringAnnual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub label: String,
    pub amount: FeeAmount,
    pub timing: FeeTiming,
}

/// Ordered list of fees attached to a loan or holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSet {
    pub fees: Vec<Fee>,
}

/// A fee with its amount fixed against a principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFee {
    pub label: String,
    pub timing: FeeTiming,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFees {
    pub items: Vec<ResolvedFee>,
    pub upfront_total: Money,
    pub recurring_annual_total: Money,
}

impl FeeSet {
    pub fn new(fees: Vec<Fee>) -> Self {
        FeeSet { fees }
    }

    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }

    pub fn validate(&self) -> FinprojResult<()> {
        for (i, fee) in self.fees.iter().enumerate() {
            let value = match fee.amount {
                FeeAmount::Fixed(v) | FeeAmount::Percent(v) => v,
            };
            ensure_non_negative(&format!("fees[{i}].amount"), value)?;
        }
        Ok(())
    }

    /// Resolve percentage fees against `principal`. The set itself is not modified.
    pub fn resolve(&self, principal: Money) -> FinprojResult<ResolvedFees> {
        self.validate()?;
        ensure_non_negative("principal", principal)?;

        let mut resolved = ResolvedFees::default();
        for fee in &self.fees {
            let overflow = || FinprojError::Overflow {
                context: format!("fee '{}'", fee.label),
            };
            let amount = match fee.amount {
                FeeAmount::Fixed(v) => v,
                FeeAmount::Percent(r) => principal.checked_mul(r).ok_or_else(overflow)?,
            };
            let total = match fee.timing {
                FeeTiming::Upfront => &mut resolved.upfront_total,
                FeeTiming::RecurringAnnual => &mut resolved.recurring_annual_total,
            };
            *total = total.checked_add(amount).ok_or_else(overflow)?;
            resolved.items.push(ResolvedFee {
                label: fee.label.clone(),
                timing: fee.timing,
                amount,
            });
        }
        Ok(resolved)
    }
}

impl ResolvedFees {
    pub fn total_over_years(&self, years: Decimal) -> Money {
        self.upfront_total + self.recurring_annual_total * years
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> FeeSet {
        FeeSet::new(vec![
            Fee {
                label: "Origination".into(),
                amount: FeeAmount::Percent(dec!(0.01)),
                timing: FeeTiming::Upfront,
            },
            Fee {
                label: "Appraisal".into(),
                amount: FeeAmount::Fixed(dec!(450)),
                timing: FeeTiming::Upfront,
            },
            Fee {
                label: "Servicing".into(),
                amount: FeeAmount::Fixed(dec!(120)),
                timing: FeeTiming::RecurringAnnual,
            },
        ])
    }

    #[test]
    fn test_resolve_against_principal() {
        let resolved = sample().resolve(dec!(200000)).unwrap();
        assert_eq!(resolved.upfront_total, dec!(2450));
        assert_eq!(resolved.recurring_annual_total, dec!(120));
        assert_eq!(resolved.items[0].amount, dec!(2000));
    }

    #[test]
    fn test_resolve_does_not_mutate() {
        let fees = sample();
        let before = fees.clone();
        let _ = fees.resolve(dec!(1000)).unwrap();
        assert_eq!(fees, before);
    }

    #[test]
    fn test_negative_fee_rejected() {
        let fees = FeeSet::new(vec![Fee {
            label: "Bad".into(),
            amount: FeeAmount::Fixed(dec!(-5)),
            timing: FeeTiming::Upfront,
        }]);
        assert!(fees.resolve(dec!(1000)).is_err());
    }

    #[test]
    fn test_total_over_years() {
        let resolved = sample().resolve(dec!(100000)).unwrap();
        assert_eq!(resolved.total_over_years(dec!(3)), dec!(1450) + dec!(360));
    }

    #[test]
    fn test_fee_set_json_is_a_list() {
        let json = r#"[{"label":"Doc","amount":{"fixed":"99"},"timing":"upfront"}]"#;
        let fees: FeeSet = serde_json::from_str(json).unwrap();
        assert_eq!(fees.fees.len(), 1);
        assert_eq!(fees.fees[0].amount, FeeAmount::Fixed(dec!(99)));
    }

    #[test]
    fn test_percent_fee_overflow_is_an_error() {
        let fees = FeeSet::new(vec![Fee {
            label: "Points".into(),
            amount: FeeAmount::Percent(dec!(100)),
            timing: FeeTiming::Upfront,
        }]);
        assert!(matches!(
            fees.resolve(Decimal::MAX),
            Err(FinprojError::Overflow { .. })
        ));
    }
}
