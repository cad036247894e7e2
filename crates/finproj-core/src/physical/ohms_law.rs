use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinprojResult;

/// Any two of the four quantities; the other two are derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhmsLawInput {
    /// Volts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<Decimal>,
    /// Amperes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Decimal>,
    /// Ohms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<Decimal>,
    /// Watts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhmsLawOutput {
    pub voltage: Decimal,
    pub current: Decimal,
    pub resistance: Decimal,
    pub power: Decimal,
}

pub fn solve_ohms_law(input: &OhmsLawInput) -> FinprojResult<ComputationOutput<OhmsLawOutput>> {
    let start = Instant::now();

    let given = [input.voltage, input.current, input.resistance, input.power]
        .iter()
        .filter(|v| v.is_some())
        .count();
    if given != 2 {
        return Err(FinprojError::invalid(
            "inputs",
            format!("Provide exactly two of voltage, current, resistance, power ({given} given)"),
        ));
    }
    for (field, value) in [
        ("resistance", input.resistance),
        ("power", input.power),
    ] {
        if matches!(value, Some(v) if v < Decimal::ZERO) {
            return Err(FinprojError::invalid(field, "Must not be negative"));
        }
    }

    let (v, i) = match (input.voltage, input.current, input.resistance, input.power) {
        (Some(v), Some(i), _, _) => (v, i),
        (Some(v), _, Some(r), _) => (v, divide(v, r, "resistance")?),
        (Some(v), _, _, Some(p)) => (v, divide(p, v, "voltage")?),
        (_, Some(i), Some(r), _) => (i * r, i),
        (_, Some(i), _, Some(p)) => (divide(p, i, "current")?, i),
        (_, _, Some(r), Some(p)) => {
            let v = sqrt(p * r, "power × resistance")?;
            (v, divide(v, r, "resistance")?)
        }
        _ => {
            return Err(FinprojError::InsufficientData(
                "Two of voltage, current, resistance, power are required".into(),
            ))
        }
    };

    let resistance = match input.resistance {
        Some(r) => r,
        None => divide(v, i, "current")?,
    };
    let output = OhmsLawOutput {
        voltage: v,
        current: i,
        resistance,
        power: input.power.unwrap_or(v * i),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Ohm's law (V = IR, P = VI)",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}

fn divide(numerator: Decimal, denominator: Decimal, field: &str) -> FinprojResult<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| FinprojError::invalid(field, "Must not be zero"))
}

fn sqrt(value: Decimal, context: &str) -> FinprojResult<Decimal> {
    value.sqrt().ok_or_else(|| FinprojError::DivisionByZero {
        context: format!("square root of {context}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn solve(input: OhmsLawInput) -> OhmsLawOutput {
        solve_ohms_law(&input).unwrap().result
    }

    #[test]
    fn test_voltage_and_resistance() {
        let out = solve(OhmsLawInput {
            voltage: Some(dec!(12)),
            resistance: Some(dec!(4)),
            ..Default::default()
        });
        assert_eq!(out.current, dec!(3));
        assert_eq!(out.power, dec!(36));
    }

    #[test]
    fn test_current_and_power() {
        let out = solve(OhmsLawInput {
            current: Some(dec!(2)),
            power: Some(dec!(100)),
            ..Default::default()
        });
        assert_eq!(out.voltage, dec!(50));
        assert_eq!(out.resistance, dec!(25));
    }

    #[test]
    fn test_resistance_and_power() {
        let out = solve(OhmsLawInput {
            resistance: Some(dec!(8)),
            power: Some(dec!(50)),
            ..Default::default()
        });
        assert!((out.voltage - dec!(20)).abs() < dec!(0.0000001));
        assert!((out.current - dec!(2.5)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_wrong_number_of_inputs() {
        assert!(solve_ohms_law(&OhmsLawInput {
            voltage: Some(dec!(1)),
            ..Default::default()
        })
        .is_err());
        assert!(solve_ohms_law(&OhmsLawInput {
            voltage: Some(dec!(1)),
            current: Some(dec!(1)),
            resistance: Some(dec!(1)),
            power: None,
        })
        .is_err());
    }

    #[test]
    fn test_zero_divisor_rejected() {
        assert!(solve_ohms_law(&OhmsLawInput {
            voltage: Some(dec!(5)),
            resistance: Some(Decimal::ZERO),
            ..Default::default()
        })
        .is_err());
    }
}
