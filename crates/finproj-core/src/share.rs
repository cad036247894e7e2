//! Encode calculator inputs for sharing, decoupled from computation.
//!
//! Flat input structs round-trip through a query string
//! (`calculator=loan&principal=200000&...`); any input round-trips
//! through a JSON envelope `{"calculator": "...", "inputs": {...}}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::FinprojResult;

const CALCULATOR_KEY: &str = "calculator";

/// An input struct that can be shared. `CALCULATOR` names it in links.
pub trait Shareable: Serialize + DeserializeOwned {
    const CALCULATOR: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope<T> {
    calculator: String,
    inputs: T,
}

pub fn to_query_string<T: Shareable>(input: &T) -> FinprojResult<String> {
    let fields = serde_urlencoded::to_string(input)?;
    if fields.is_empty() {
        return Ok(format!("{CALCULATOR_KEY}={}", T::CALCULATOR));
    }
    Ok(format!("{CALCULATOR_KEY}={}&{fields}", T::CALCULATOR))
}

/// Decode a query string produced by [`to_query_string`]. A leading `?` is accepted.
pub fn from_query_string<T: Shareable>(query: &str) -> FinprojResult<T> {
    let query = query.trim().trim_start_matches('?');
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
    let calculator = pairs
        .iter()
        .find(|(k, _)| k == CALCULATOR_KEY)
        .map(|(_, v)| v.as_str());
    check_calculator::<T>(calculator)?;
    Ok(serde_urlencoded::from_str(query)?)
}

pub fn to_json<T: Shareable>(input: &T) -> FinprojResult<String> {
    let envelope = Envelope {
        calculator: T::CALCULATOR.to_string(),
        inputs: input,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn from_json<T: Shareable>(json: &str) -> FinprojResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(json)?;
    check_calculator::<T>(Some(&envelope.calculator))?;
    Ok(envelope.inputs)
}

/// Name of the calculator a query string belongs to, if any.
pub fn calculator_of(query: &str) -> FinprojResult<Option<String>> {
    let query = query.trim().trim_start_matches('?');
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
    Ok(pairs
        .into_iter()
        .find(|(k, _)| k == CALCULATOR_KEY)
        .map(|(_, v)| v))
}

fn check_calculator<T: Shareable>(found: Option<&str>) -> FinprojResult<()> {
    match found {
        Some(name) if name == T::CALCULATOR => Ok(()),
        Some(name) => Err(FinprojError::invalid(
            CALCULATOR_KEY,
            format!("Link is for '{name}', expected '{}'", T::CALCULATOR),
        )),
        None => Err(FinprojError::invalid(
            CALCULATOR_KEY,
            "Link does not name a calculator",
        )),
    }
}

#[cfg(feature = "lending")]
impl Shareable for crate::calculators::loan::LoanInput {
    const CALCULATOR: &'static str = "loan";
}

#[cfg(feature = "lending")]
impl Shareable for crate::calculators::auto_loan::AutoLoanInput {
    const CALCULATOR: &'static str = "auto_loan";
}

#[cfg(feature = "housing")]
impl Shareable for crate::calculators::rent_vs_buy::RentVsBuyInput {
    const CALCULATOR: &'static str = "rent_vs_buy";
}

#[cfg(feature = "physical")]
impl Shareable for crate::physical::heat_index::HeatIndexInput {
    const CALCULATOR: &'static str = "heat_index";
}

#[cfg(feature = "conversions")]
impl Shareable for crate::conversions::units::UnitConversionInput {
    const CALCULATOR: &'static str = "unit_conversion";
}
