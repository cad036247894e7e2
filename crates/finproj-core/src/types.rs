use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinprojError;
use crate::time_value;
use crate::FinprojResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Longest loan term, payment stream or projection: 100 years of months.
pub const MAX_PERIODS: u32 = 1200;

/// Length of one projection or repayment period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    #[default]
    Month,
    Year,
}

impl PeriodUnit {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PeriodUnit::Month => 12,
            PeriodUnit::Year => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodUnit::Month => "month",
            PeriodUnit::Year => "year",
        }
    }
}

/// Fixed-rate, fully amortizing loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate (0.06 = 6%)
    pub annual_rate: Rate,
    /// Number of repayment periods
    pub term_periods: u32,
    #[serde(default)]
    pub period_unit: PeriodUnit,
}

impl LoanTerms {
    pub fn validate(&self) -> FinprojResult<()> {
        ensure_non_negative("principal", self.principal)?;
        ensure_non_negative("annual_rate", self.annual_rate)?;
        if self.term_periods == 0 {
            return Err(FinprojError::invalid(
                "term_periods",
                "Loan term must be at least one period",
            ));
        }
        if self.term_periods > MAX_PERIODS {
            return Err(FinprojError::invalid(
                "term_periods",
                format!("Loan term is limited to {MAX_PERIODS} periods"),
            ));
        }
        Ok(())
    }

    /// Rate charged per repayment period.
    pub fn periodic_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(self.period_unit.periods_per_year())
    }

    /// Fixed payment that fully amortizes the loan.
    pub fn payment(&self) -> FinprojResult<Money> {
        self.validate()?;
        time_value::amortized_payment(self.principal, self.periodic_rate(), self.term_periods)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> FinprojResult<()> {
    if value < Decimal::ZERO {
        return Err(FinprojError::invalid(field, "Must not be negative"));
    }
    Ok(())
}

pub(crate) fn ensure_positive(field: &str, value: Decimal) -> FinprojResult<()> {
    if value <= Decimal::ZERO {
        return Err(FinprojError::invalid(field, "Must be greater than zero"));
    }
    Ok(())
}

/// Growth rates may be negative (depreciation) but not at or below -100%.
pub(crate) fn ensure_growth_rate(field: &str, value: Rate) -> FinprojResult<()> {
    if value <= Decimal::NEGATIVE_ONE {
        return Err(FinprojError::invalid(
            field,
            "Growth rate must be greater than -100%",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
