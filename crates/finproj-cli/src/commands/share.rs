use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use finproj_core::calculators::auto_loan::AutoLoanInput;
use finproj_core::calculators::loan::LoanInput;
use finproj_core::calculators::rent_vs_buy::RentVsBuyInput;
use finproj_core::conversions::units::UnitConversionInput;
use finproj_core::physical::heat_index::HeatIndexInput;
use finproj_core::share::{self as link, Shareable};

use crate::input;

/// Calculators whose inputs can be shared as a link
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SharedCalculator {
    Loan,
    AutoLoan,
    RentVsBuy,
    HeatIndex,
    UnitConversion,
}

/// Arguments for encoding or decoding a shared link
#[derive(Args)]
pub struct ShareArgs {
    /// Calculator whose input is being encoded
    #[arg(long, required_unless_present = "decode")]
    pub calculator: Option<SharedCalculator>,

    /// Path to JSON/YAML input file (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Decode this query string back into calculator inputs
    #[arg(long, conflicts_with_all = ["calculator", "input"])]
    pub decode: Option<String>,
}

pub fn run_share(args: ShareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(query) = args.decode {
        let name = link::calculator_of(&query)?.ok_or("query string does not name a calculator")?;
        return match name.as_str() {
            LoanInput::CALCULATOR => decode::<LoanInput>(&query),
            AutoLoanInput::CALCULATOR => decode::<AutoLoanInput>(&query),
            RentVsBuyInput::CALCULATOR => decode::<RentVsBuyInput>(&query),
            HeatIndexInput::CALCULATOR => decode::<HeatIndexInput>(&query),
            UnitConversionInput::CALCULATOR => decode::<UnitConversionInput>(&query),
            other => Err(format!("'{}' is not a shareable calculator", other).into()),
        };
    }

    let path = args.input.as_deref();
    match args.calculator.ok_or("--calculator is required")? {
        SharedCalculator::Loan => encode::<LoanInput>(path),
        SharedCalculator::AutoLoan => encode::<AutoLoanInput>(path),
        SharedCalculator::RentVsBuy => encode::<RentVsBuyInput>(path),
        SharedCalculator::HeatIndex => encode::<HeatIndexInput>(path),
        SharedCalculator::UnitConversion => encode::<UnitConversionInput>(path),
    }
}

fn encode<T: Shareable>(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: T = input::from_file_or_stdin(path)?
        .ok_or("--input <file> or stdin required to build a link")?;
    Ok(json!({
        "result": {
            "calculator": T::CALCULATOR,
            "query": link::to_query_string(&inputs)?,
            "json": link::to_json(&inputs)?,
        }
    }))
}

fn decode<T: Shareable>(query: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: T = link::from_query_string(query)?;
    Ok(json!({
        "result": {
            "calculator": T::CALCULATOR,
            "inputs": serde_json::to_value(&inputs)?,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_routes_by_calculator_name() {
        let value = decode::<HeatIndexInput>(
            "calculator=heat_index&temperature=95&relative_humidity=60&scale=fahrenheit",
        )
        .unwrap();
        assert_eq!(value["result"]["calculator"], "heat_index");
        assert_eq!(value["result"]["inputs"]["temperature"], "95");
    }

    #[test]
    fn test_decode_rejects_other_calculator() {
        assert!(decode::<LoanInput>("calculator=heat_index&temperature=95").is_err());
    }
}
