use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinprojError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FinprojError {
    /// Shorthand for the boundary validation failures raised everywhere.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FinprojError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FinprojError {
    fn from(e: serde_json::Error) -> Self {
        FinprojError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "share")]
impl From<serde_urlencoded::ser::Error> for FinprojError {
    fn from(e: serde_urlencoded::ser::Error) -> Self {
        FinprojError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "share")]
impl From<serde_urlencoded::de::Error> for FinprojError {
    fn from(e: serde_urlencoded::de::Error) -> Self {
        FinprojError::SerializationError(e.to_string())
    }
}
