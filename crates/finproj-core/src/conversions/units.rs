use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinprojResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    Length,
    Mass,
    Volume,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    // Length (base: metre)
    Meter,
    Kilometer,
    Centimeter,
    Millimeter,
    Mile,
    Yard,
    Foot,
    Inch,
    NauticalMile,
    // Mass (base: kilogram)
    Kilogram,
    Gram,
    Milligram,
    Tonne,
    Pound,
    Ounce,
    Stone,
    // Volume (base: litre)
    Liter,
    Milliliter,
    CubicMeter,
    GallonUs,
    QuartUs,
    PintUs,
    CupUs,
    FluidOunceUs,
    // Temperature (converted through kelvin)
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Unit {
    pub fn category(self) -> UnitCategory {
        use Unit::*;
        match self {
            Meter | Kilometer | Centimeter | Millimeter | Mile | Yard | Foot | Inch
            | NauticalMile => UnitCategory::Length,
            Kilogram | Gram | Milligram | Tonne | Pound | Ounce | Stone => UnitCategory::Mass,
            Liter | Milliliter | CubicMeter | GallonUs | QuartUs | PintUs | CupUs
            | FluidOunceUs => UnitCategory::Volume,
            Celsius | Fahrenheit | Kelvin => UnitCategory::Temperature,
        }
    }

    /// Size of one unit in the category's base unit. None for temperatures.
    fn factor(self) -> Option<Decimal> {
        use Unit::*;
        let f = match self {
            Meter => dec!(1),
            Kilometer => dec!(1000),
            Centimeter => dec!(0.01),
            Millimeter => dec!(0.001),
            Mile => dec!(1609.344),
            Yard => dec!(0.9144),
            Foot => dec!(0.3048),
            Inch => dec!(0.0254),
            NauticalMile => dec!(1852),
            Kilogram => dec!(1),
            Gram => dec!(0.001),
            Milligram => dec!(0.000001),
            Tonne => dec!(1000),
            Pound => dec!(0.45359237),
            Ounce => dec!(0.028349523125),
            Stone => dec!(6.35029318),
            Liter => dec!(1),
            Milliliter => dec!(0.001),
            CubicMeter => dec!(1000),
            GallonUs => dec!(3.785411784),
            QuartUs => dec!(0.946352946),
            PintUs => dec!(0.473176473),
            CupUs => dec!(0.2365882365),
            FluidOunceUs => dec!(0.0295735295625),
            Celsius | Fahrenheit | Kelvin => return None,
        };
        Some(f)
    }
}

/// Flat conversion input, suitable for sharing as a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionInput {
    pub value: Decimal,
    pub from: Unit,
    pub to: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionOutput {
    pub category: UnitCategory,
    pub value: Decimal,
    pub from: Unit,
    pub to: Unit,
    pub converted: Decimal,
}

/// Convert a value between two units of the same category.
pub fn convert(value: Decimal, from: Unit, to: Unit) -> FinprojResult<Decimal> {
    if from.category() != to.category() {
        return Err(FinprojError::invalid(
            "to",
            format!(
                "Cannot convert {:?} ({:?}) to {:?} ({:?})",
                from,
                from.category(),
                to,
                to.category()
            ),
        ));
    }
    if from == to {
        return Ok(value);
    }

    match (from.factor(), to.factor()) {
        (Some(f_from), Some(f_to)) => value
            .checked_mul(f_from)
            .and_then(|base| base.checked_div(f_to))
            .ok_or_else(|| overflow(from, to)),
        _ => {
            let kelvin = to_kelvin(value, from).ok_or_else(|| overflow(from, to))?;
            if kelvin < Decimal::ZERO {
                return Err(FinprojError::invalid("value", "Temperature is below absolute zero"));
            }
            from_kelvin(kelvin, to).ok_or_else(|| overflow(from, to))
        }
    }
}

fn to_kelvin(value: Decimal, unit: Unit) -> Option<Decimal> {
    match unit {
        Unit::Celsius => value.checked_add(dec!(273.15)),
        Unit::Fahrenheit => value
            .checked_sub(dec!(32))
            .and_then(|v| v.checked_mul(dec!(5)))
            .map(|v| v / dec!(9) + dec!(273.15)),
        _ => Some(value),
    }
}

fn from_kelvin(kelvin: Decimal, unit: Unit) -> Option<Decimal> {
    match unit {
        Unit::Celsius => Some(kelvin - dec!(273.15)),
        Unit::Fahrenheit => (kelvin - dec!(273.15))
            .checked_mul(dec!(9))
            .and_then(|v| (v / dec!(5)).checked_add(dec!(32))),
        _ => Some(kelvin),
    }
}

fn overflow(from: Unit, to: Unit) -> FinprojError {
    FinprojError::Overflow {
        context: format!("converting {from:?} to {to:?}"),
    }
}

pub fn convert_units(
    input: &UnitConversionInput,
) -> FinprojResult<ComputationOutput<UnitConversionOutput>> {
    let start = Instant::now();
    let converted = convert(input.value, input.from, input.to)?;

    let output = UnitConversionOutput {
        category: input.from.category(),
        value: input.value,
        from: input.from,
        to: input.to,
        converted,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Factor conversion via SI base unit",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}
