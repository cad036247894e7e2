use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use finproj_core::share::{self as link, Shareable};
use finproj_core::FinprojResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// JSON in, calculator, JSON out.
fn json_call<I, O, F>(input_json: &str, calculate: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> FinprojResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::calculators::loan::calculate_loan)
}

#[napi]
pub fn calculate_apr(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::calculators::apr::calculate_apr)
}

#[napi]
pub fn calculate_auto_loan(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::calculators::auto_loan::calculate_auto_loan)
}

// ---------------------------------------------------------------------------
// Commission / housing
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_commission(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::calculators::commission::calculate_commission)
}

#[napi]
pub fn rent_vs_buy(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::calculators::rent_vs_buy::calculate_rent_vs_buy)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[napi]
pub fn run_projection(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::projection::run_projection)
}

/// Takes `{"a": ProjectionInput, "b": ProjectionInput}`.
#[napi]
pub fn compare_projections(input_json: String) -> NapiResult<String> {
    #[derive(serde::Deserialize)]
    struct Pair {
        a: finproj_core::projection::ProjectionInput,
        b: finproj_core::projection::ProjectionInput,
    }

    json_call(&input_json, |pair: &Pair| {
        let a = finproj_core::projection::run_projection(&pair.a)?;
        let b = finproj_core::projection::run_projection(&pair.b)?;
        finproj_core::comparison::compare_projections(&a, &b)
    })
}

/// Takes `{"net_amount", "payment", "periods", "periodic_fees"?, "guess"?}`.
#[napi]
pub fn estimate_effective_rate(input_json: String) -> NapiResult<String> {
    #[derive(serde::Deserialize)]
    struct RateQuery {
        net_amount: rust_decimal::Decimal,
        #[serde(flatten)]
        stream: finproj_core::rate_solver::PaymentStream,
        #[serde(default)]
        guess: rust_decimal::Decimal,
    }

    json_call(&input_json, |q: &RateQuery| {
        finproj_core::rate_solver::estimate_effective_rate(q.net_amount, &q.stream, q.guess)
    })
}

// ---------------------------------------------------------------------------
// Conversions / physical
// ---------------------------------------------------------------------------

#[napi]
pub fn convert_number_base(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::conversions::number_base::convert_number_base)
}

#[napi]
pub fn convert_units(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::conversions::units::convert_units)
}

#[napi]
pub fn heat_index(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::physical::heat_index::calculate_heat_index)
}

#[napi]
pub fn ohms_law(input_json: String) -> NapiResult<String> {
    json_call(&input_json, finproj_core::physical::ohms_law::solve_ohms_law)
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

fn encode<T: Shareable>(input_json: &str) -> NapiResult<String> {
    let input: T = serde_json::from_str(input_json).map_err(to_napi_error)?;
    link::to_query_string(&input).map_err(to_napi_error)
}

fn decode<T: Shareable>(query: &str) -> NapiResult<String> {
    let input: T = link::from_query_string(query).map_err(to_napi_error)?;
    link::to_json(&input).map_err(to_napi_error)
}

/// Query string for a calculator's inputs, e.g. `calculator=loan&principal=...`.
#[napi]
pub fn share_link(calculator: String, input_json: String) -> NapiResult<String> {
    use finproj_core::calculators::{auto_loan::AutoLoanInput, loan::LoanInput};
    use finproj_core::calculators::rent_vs_buy::RentVsBuyInput;
    use finproj_core::conversions::units::UnitConversionInput;
    use finproj_core::physical::heat_index::HeatIndexInput;

    match calculator.as_str() {
        LoanInput::CALCULATOR => encode::<LoanInput>(&input_json),
        AutoLoanInput::CALCULATOR => encode::<AutoLoanInput>(&input_json),
        RentVsBuyInput::CALCULATOR => encode::<RentVsBuyInput>(&input_json),
        HeatIndexInput::CALCULATOR => encode::<HeatIndexInput>(&input_json),
        UnitConversionInput::CALCULATOR => encode::<UnitConversionInput>(&input_json),
        other => Err(to_napi_error(format!("'{other}' is not a shareable calculator"))),
    }
}

/// Decode a shared query string into `{"calculator": ..., "inputs": {...}}`.
#[napi]
pub fn open_share_link(query: String) -> NapiResult<String> {
    use finproj_core::calculators::{auto_loan::AutoLoanInput, loan::LoanInput};
    use finproj_core::calculators::rent_vs_buy::RentVsBuyInput;
    use finproj_core::conversions::units::UnitConversionInput;
    use finproj_core::physical::heat_index::HeatIndexInput;

    let name = link::calculator_of(&query)
        .map_err(to_napi_error)?
        .ok_or_else(|| to_napi_error("query string does not name a calculator"))?;
    match name.as_str() {
        LoanInput::CALCULATOR => decode::<LoanInput>(&query),
        AutoLoanInput::CALCULATOR => decode::<AutoLoanInput>(&query),
        RentVsBuyInput::CALCULATOR => decode::<RentVsBuyInput>(&query),
        HeatIndexInput::CALCULATOR => decode::<HeatIndexInput>(&query),
        UnitConversionInput::CALCULATOR => decode::<UnitConversionInput>(&query),
        other => Err(to_napi_error(format!("'{other}' is not a shareable calculator"))),
    }
}
