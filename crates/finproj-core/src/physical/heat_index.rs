use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinprojResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureScale {
    #[default]
    Fahrenheit,
    Celsius,
}

/// NWS heat-risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatRisk {
    None,
    Caution,
    ExtremeCaution,
    Danger,
    ExtremeDanger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatIndexFormula {
    Simple,
    Rothfusz,
}

/// Flat heat index input, suitable for sharing as a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatIndexInput {
    pub temperature: Decimal,
    /// Percent, 0–100
    pub relative_humidity: Decimal,
    #[serde(default)]
    pub scale: TemperatureScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatIndexOutput {
    pub heat_index_f: Decimal,
    pub heat_index_c: Decimal,
    pub risk: HeatRisk,
    pub formula: HeatIndexFormula,
}

/// Bound on the input temperature in either scale; keeps the regression's
/// fourth-order terms well inside Decimal range.
const MAX_TEMPERATURE: Decimal = dec!(1000);
const MAX_FAHRENHEIT: Decimal = dec!(2000);

/// Heat index in °F from air temperature (°F) and relative humidity (%).
pub fn heat_index_f(t: Decimal, rh: Decimal) -> FinprojResult<(Decimal, HeatIndexFormula)> {
    if t.abs() > MAX_FAHRENHEIT {
        return Err(FinprojError::invalid(
            "temperature",
            format!("Temperature must be within ±{MAX_FAHRENHEIT}°F"),
        ));
    }
    if rh < Decimal::ZERO || rh > dec!(100) {
        return Err(FinprojError::invalid(
            "relative_humidity",
            "Relative humidity must be between 0 and 100",
        ));
    }

    let simple = dec!(0.5) * (t + dec!(61) + (t - dec!(68)) * dec!(1.2) + rh * dec!(0.094));
    if (simple + t) / dec!(2) < dec!(80) {
        return Ok((simple, HeatIndexFormula::Simple));
    }

    let t2 = t * t;
    let rh2 = rh * rh;
    let mut hi = dec!(-42.379) + dec!(2.04901523) * t + dec!(10.14333127) * rh
        - dec!(0.22475541) * t * rh
        - dec!(0.00683783) * t2
        - dec!(0.05481717) * rh2
        + dec!(0.00122874) * t2 * rh
        + dec!(0.00085282) * t * rh2
        - dec!(0.00000199) * t2 * rh2;

    let in_band = |low: Decimal, high: Decimal| t >= low && t <= high;
    if rh < dec!(13) && in_band(dec!(80), dec!(112)) {
        let spread = (dec!(17) - (t - dec!(95)).abs()) / dec!(17);
        let root = spread.sqrt().unwrap_or_default();
        hi -= (dec!(13) - rh) / dec!(4) * root;
    } else if rh > dec!(85) && in_band(dec!(80), dec!(87)) {
        hi += (rh - dec!(85)) / dec!(10) * ((dec!(87) - t) / dec!(5));
    }

    Ok((hi, HeatIndexFormula::Rothfusz))
}

pub fn classify(heat_index_f: Decimal) -> HeatRisk {
    if heat_index_f < dec!(80) {
        HeatRisk::None
    } else if heat_index_f < dec!(90) {
        HeatRisk::Caution
    } else if heat_index_f < dec!(103) {
        HeatRisk::ExtremeCaution
    } else if heat_index_f < dec!(125) {
        HeatRisk::Danger
    } else {
        HeatRisk::ExtremeDanger
    }
}

pub fn calculate_heat_index(
    input: &HeatIndexInput,
) -> FinprojResult<ComputationOutput<HeatIndexOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.relative_humidity < Decimal::ZERO || input.relative_humidity > dec!(100) {
        return Err(FinprojError::invalid(
            "relative_humidity",
            "Relative humidity must be between 0 and 100",
        ));
    }

    if input.temperature.abs() > MAX_TEMPERATURE {
        return Err(FinprojError::invalid(
            "temperature",
            format!("Temperature must be within ±{MAX_TEMPERATURE} degrees"),
        ));
    }

    let t_f = match input.scale {
        TemperatureScale::Fahrenheit => input.temperature,
        TemperatureScale::Celsius => input.temperature * dec!(9) / dec!(5) + dec!(32),
    };
    if t_f < dec!(-459.67) {
        return Err(FinprojError::invalid(
            "temperature",
            "Temperature is below absolute zero",
        ));
    }
    if t_f < dec!(80) {
        warnings.push("Heat index is only meaningful at or above 80°F (26.7°C)".to_string());
    }

    let (hi_f, formula) = heat_index_f(t_f, input.relative_humidity)?;
    let output = HeatIndexOutput {
        heat_index_f: hi_f,
        heat_index_c: (hi_f - dec!(32)) * dec!(5) / dec!(9),
        risk: classify(hi_f),
        formula,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NWS heat index (Steadman / Rothfusz regression)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
