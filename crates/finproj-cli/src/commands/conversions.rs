use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finproj_core::conversions::number_base::{self, NumberBaseInput};
use finproj_core::conversions::units::{self, Unit, UnitConversionInput};

use super::{load_shareable, parse_named, required};
use crate::input;

/// Arguments for number-base conversion
#[derive(Args)]
pub struct BaseConvertArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Integer to convert; 0x, 0o and 0b prefixes are recognised
    #[arg(allow_hyphen_values = true)]
    pub value: Option<String>,

    /// Radix of the input when it has no prefix
    #[arg(long)]
    pub from: Option<u32>,

    /// Radix to convert to
    #[arg(long, default_value_t = 10)]
    pub to: u32,
}

pub fn run_base_convert(args: BaseConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base_input: NumberBaseInput = match args.value {
        Some(value) => NumberBaseInput {
            value,
            from_base: args.from,
            to_base: args.to,
        },
        None => input::from_file_or_stdin(args.input.as_deref())?
            .ok_or("a value, --input <file> or stdin is required")?,
    };

    let result = number_base::convert_number_base(&base_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for unit conversion
#[derive(Args)]
pub struct UnitConvertArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Shared link query string (calculator=unit_conversion&...)
    #[arg(long)]
    pub query: Option<String>,

    /// Value to convert
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<Decimal>,

    /// Source unit, e.g. mile, pound, gallon_us, fahrenheit
    #[arg(long, value_parser = parse_named::<Unit>)]
    pub from: Option<Unit>,

    /// Target unit
    #[arg(long, value_parser = parse_named::<Unit>)]
    pub to: Option<Unit>,
}

pub fn run_unit_convert(args: UnitConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let unit_input: UnitConversionInput =
        match load_shareable(args.input.as_deref(), args.query.as_deref())? {
            Some(input) => input,
            None => UnitConversionInput {
                value: required(args.value, "value")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
            },
        };

    let result = units::convert_units(&unit_input)?;
    Ok(serde_json::to_value(result)?)
}
