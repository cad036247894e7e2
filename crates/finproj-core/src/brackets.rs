use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::types::*;
use crate::FinprojResult;

/// One band of a progressive schedule. `upper: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
}

/// Progressive rate table (tax brackets, commission tiers).
///
/// Brackets are ascending and non-overlapping; only the last one is
/// unbounded. The invariant is checked on construction and on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketSchedule {
    brackets: Vec<Bracket>,
}

/// The slice of an amount that fell inside one bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketPortion {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
    pub portion: Money,
    pub weighted: Money,
}

impl BracketSchedule {
    pub fn new(brackets: Vec<Bracket>) -> FinprojResult<Self> {
        if brackets.is_empty() {
            return Err(FinprojError::InsufficientData(
                "Bracket schedule needs at least one bracket".into(),
            ));
        }

        let last = brackets.len() - 1;
        let mut previous_upper: Option<Money> = None;
        for (i, b) in brackets.iter().enumerate() {
            let field = format!("brackets[{i}]");
            ensure_non_negative(&format!("{field}.lower"), b.lower)?;
            ensure_non_negative(&format!("{field}.rate"), b.rate)?;

            if let Some(prev) = previous_upper {
                if b.lower < prev {
                    return Err(FinprojError::invalid(
                        field,
                        "Brackets must be ascending and must not overlap",
                    ));
                }
            }

            match (b.upper, i == last) {
                (Some(upper), false) => {
                    if upper <= b.lower {
                        return Err(FinprojError::invalid(
                            field,
                            "Upper bound must exceed lower bound",
                        ));
                    }
                    previous_upper = Some(upper);
                }
                (None, true) => {}
                (Some(_), true) => {
                    return Err(FinprojError::invalid(
                        field,
                        "Last bracket must be unbounded",
                    ));
                }
                (None, false) => {
                    return Err(FinprojError::invalid(
                        field,
                        "Only the last bracket may be unbounded",
                    ));
                }
            }
        }

        Ok(BracketSchedule { brackets })
    }

    /// Single unbounded bracket: a flat rate on the whole amount.
    pub fn flat(rate: Rate) -> FinprojResult<Self> {
        Self::new(vec![Bracket {
            lower: Decimal::ZERO,
            upper: None,
            rate,
        }])
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Rate-weighted total of `amount` across the brackets it passes through.
    pub fn apply(&self, amount: Money) -> FinprojResult<Money> {
        self.breakdown(amount)?
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.weighted))
            .ok_or_else(|| overflow(amount))
    }

    /// Per-bracket slices of `amount`, in ascending order.
    pub fn breakdown(&self, amount: Money) -> FinprojResult<Vec<BracketPortion>> {
        let mut portions = Vec::new();
        for b in &self.brackets {
            if amount <= b.lower {
                break;
            }
            let top = match b.upper {
                Some(upper) => amount.min(upper),
                None => amount,
            };
            let portion = top - b.lower;
            let weighted = portion.checked_mul(b.rate).ok_or_else(|| overflow(amount))?;
            portions.push(BracketPortion {
                lower: b.lower,
                upper: b.upper,
                rate: b.rate,
                portion,
                weighted,
            });
            if matches!(b.upper, Some(upper) if amount <= upper) {
                break;
            }
        }
        Ok(portions)
    }

    /// Rate of the bracket that contains `amount`.
    pub fn marginal_rate(&self, amount: Money) -> Rate {
        self.brackets
            .iter()
            .rev()
            .find(|b| amount > b.lower)
            .or_else(|| self.brackets.first())
            .map(|b| b.rate)
            .unwrap_or_default()
    }
}

impl TryFrom<Vec<Bracket>> for BracketSchedule {
    type Error = FinprojError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        BracketSchedule::new(brackets)
    }
}

impl From<BracketSchedule> for Vec<Bracket> {
    fn from(schedule: BracketSchedule) -> Self {
        schedule.brackets
    }
}

/// Free-function form of [`BracketSchedule::apply`].
pub fn apply_bracket_schedule(amount: Money, schedule: &BracketSchedule) -> FinprojResult<Money> {
    schedule.apply(amount)
}

fn overflow(amount: Money) -> FinprojError {
    FinprojError::Overflow {
        context: format!("bracket schedule applied to {amount}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tiers() -> BracketSchedule {
        BracketSchedule::new(vec![
            Bracket {
                lower: dec!(0),
                upper: Some(dec!(25000)),
                rate: dec!(0.03),
            },
            Bracket {
                lower: dec!(25000),
                upper: Some(dec!(50000)),
                rate: dec!(0.05),
            },
            Bracket {
                lower: dec!(50000),
                upper: None,
                rate: dec!(0.07),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_tiered_known_answer() {
        // 750 + 1250 + 700
        assert_eq!(tiers().apply(dec!(60000)).unwrap(), dec!(2700));
    }

    #[test]
    fn test_zero_amount() {
        assert_eq!(tiers().apply(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_amount_on_boundary_stops() {
        let portions = tiers().breakdown(dec!(25000)).unwrap();
        assert_eq!(portions.len(), 1);
        assert_eq!(portions[0].weighted, dec!(750));
    }

    #[test]
    fn test_flat_schedule() {
        let flat = BracketSchedule::flat(dec!(0.05)).unwrap();
        assert_eq!(flat.apply(dec!(50000)).unwrap(), dec!(2500));
    }

    #[test]
    fn test_marginal_rate() {
        let s = tiers();
        assert_eq!(s.marginal_rate(dec!(10000)), dec!(0.03));
        assert_eq!(s.marginal_rate(dec!(30000)), dec!(0.05));
        assert_eq!(s.marginal_rate(dec!(90000)), dec!(0.07));
    }

    #[test]
    fn test_overlap_rejected() {
        let result = BracketSchedule::new(vec![
            Bracket {
                lower: dec!(0),
                upper: Some(dec!(100)),
                rate: dec!(0.1),
            },
            Bracket {
                lower: dec!(50),
                upper: None,
                rate: dec!(0.2),
            },
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bounded_last_bracket_rejected() {
        let result = BracketSchedule::new(vec![Bracket {
            lower: dec!(0),
            upper: Some(dec!(100)),
            rate: dec!(0.1),
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(BracketSchedule::new(vec![]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"[{"lower":"0","rate":"0.1"},{"lower":"10","rate":"0.2"}]"#;
        assert!(serde_json::from_str::<BracketSchedule>(bad).is_err());

        let good = r#"[{"lower":"0","upper":"10","rate":"0.1"},{"lower":"10","rate":"0.2"}]"#;
        let schedule: BracketSchedule = serde_json::from_str(good).unwrap();
        assert_eq!(schedule.apply(dec!(20)).unwrap(), dec!(3));
    }

    #[test]
    fn test_overflowing_amount_is_an_error() {
        let flat = BracketSchedule::flat(dec!(1000)).unwrap();
        let err = flat.apply(Decimal::MAX).unwrap_err();
        assert!(matches!(err, FinprojError::Overflow { .. }));
        assert!(flat.breakdown(Decimal::MAX).is_err());
    }
}
