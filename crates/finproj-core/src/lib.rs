pub mod amortization;
pub mod brackets;
pub mod comparison;
pub mod error;
pub mod fees;
pub mod projection;
pub mod rate_solver;
pub mod time_value;
pub mod types;

#[cfg(any(
    feature = "lending",
    feature = "commission",
    feature = "housing"
))]
pub mod calculators;

#[cfg(feature = "conversions")]
pub mod conversions;

#[cfg(feature = "physical")]
pub mod physical;

#[cfg(feature = "share")]
pub mod share;

pub use error::FinprojError;
pub use types::*;

/// Standard result type for all finproj operations
pub type FinprojResult<T> = Result<T, FinprojError>;
