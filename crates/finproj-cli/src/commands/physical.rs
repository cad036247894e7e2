use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finproj_core::physical::heat_index::{self, HeatIndexInput, TemperatureScale};
use finproj_core::physical::ohms_law::{self, OhmsLawInput};

use super::{load_shareable, parse_named, required};
use crate::input;

/// Arguments for the heat index calculator
#[derive(Args)]
pub struct HeatIndexArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Shared link query string (calculator=heat_index&...)
    #[arg(long)]
    pub query: Option<String>,

    /// Air temperature
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<Decimal>,

    /// Relative humidity in percent (0-100)
    #[arg(long)]
    pub humidity: Option<Decimal>,

    /// Scale of --temperature: fahrenheit or celsius
    #[arg(long, default_value = "fahrenheit", value_parser = parse_named::<TemperatureScale>)]
    pub scale: TemperatureScale,
}

pub fn run_heat_index(args: HeatIndexArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let hi_input: HeatIndexInput = match load_shareable(args.input.as_deref(), args.query.as_deref())? {
        Some(input) => input,
        None => HeatIndexInput {
            temperature: required(args.temperature, "temperature")?,
            relative_humidity: required(args.humidity, "humidity")?,
            scale: args.scale,
        },
    };

    let result = heat_index::calculate_heat_index(&hi_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for Ohm's law; give exactly two quantities
#[derive(Args)]
pub struct OhmsLawArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Volts
    #[arg(long, allow_hyphen_values = true)]
    pub voltage: Option<Decimal>,

    /// Amperes
    #[arg(long, allow_hyphen_values = true)]
    pub current: Option<Decimal>,

    /// Ohms
    #[arg(long)]
    pub resistance: Option<Decimal>,

    /// Watts
    #[arg(long)]
    pub power: Option<Decimal>,
}

pub fn run_ohms_law(args: OhmsLawArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let given = [args.voltage, args.current, args.resistance, args.power]
        .iter()
        .any(Option::is_some);

    let ohms_input: OhmsLawInput = if given {
        OhmsLawInput {
            voltage: args.voltage,
            current: args.current,
            resistance: args.resistance,
            power: args.power,
        }
    } else {
        input::from_file_or_stdin(args.input.as_deref())?
            .ok_or("two of --voltage, --current, --resistance, --power are required")?
    };

    let result = ohms_law::solve_ohms_law(&ohms_input)?;
    Ok(serde_json::to_value(result)?)
}
