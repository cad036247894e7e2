use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinprojError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinprojResult;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberBaseInput {
    /// Integer text, optionally signed and prefixed with 0x / 0o / 0b
    pub value: String,
    /// Radix of `value`; inferred from a prefix when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_base: Option<u32>,
    #[serde(default = "default_target")]
    pub to_base: u32,
}

fn default_target() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberBaseOutput {
    pub decimal: String,
    pub binary: String,
    pub octal: String,
    pub hexadecimal: String,
    pub to_base: u32,
    pub converted: String,
}

/// Parse `text` in `radix` (2..=36). A 0x/0o/0b prefix overrides a missing radix.
pub fn parse_integer(text: &str, radix: Option<u32>) -> FinprojResult<i128> {
    let trimmed = text.trim().replace('_', "");
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed.as_str())),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (prefix_radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (Some(16), rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (Some(8), rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (Some(2), rest)
    } else {
        (None, lower.as_str())
    };

    let radix = match (radix, prefix_radix) {
        (Some(r), Some(p)) if r != p => {
            return Err(FinprojError::invalid(
                "from_base",
                format!("Prefix implies base {p} but base {r} was given"),
            ))
        }
        (Some(r), _) => r,
        (None, Some(p)) => p,
        (None, None) => 10,
    };
    ensure_radix("from_base", radix)?;

    if digits.is_empty() {
        return Err(FinprojError::invalid("value", "No digits to convert"));
    }
    if digits.starts_with(['+', '-']) {
        return Err(FinprojError::invalid("value", "Sign must precede any prefix"));
    }

    let magnitude = u128::from_str_radix(digits, radix).map_err(|e| {
        FinprojError::invalid("value", format!("'{text}' is not a base-{radix} integer: {e}"))
    })?;
    let value = if negative {
        0i128.checked_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).ok()
    };
    value.ok_or_else(|| FinprojError::invalid("value", format!("'{text}' does not fit in 128 bits")))
}

/// Render `value` in `radix` (2..=36) using lowercase digits.
pub fn format_integer(value: i128, radix: u32) -> FinprojResult<String> {
    ensure_radix("to_base", radix)?;
    if value == 0 {
        return Ok("0".into());
    }

    let mut magnitude = value.unsigned_abs();
    let radix = u128::from(radix);
    let mut out = Vec::new();
    while magnitude > 0 {
        out.push(DIGITS[(magnitude % radix) as usize]);
        magnitude /= radix;
    }
    if value < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).map_err(|e| FinprojError::SerializationError(e.to_string()))
}

pub fn convert_number_base(
    input: &NumberBaseInput,
) -> FinprojResult<ComputationOutput<NumberBaseOutput>> {
    let start = Instant::now();
    let value = parse_integer(&input.value, input.from_base)?;

    let output = NumberBaseOutput {
        decimal: format_integer(value, 10)?,
        binary: format_integer(value, 2)?,
        octal: format_integer(value, 8)?,
        hexadecimal: format_integer(value, 16)?,
        to_base: input.to_base,
        converted: format_integer(value, input.to_base)?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Positional radix conversion",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}

fn ensure_radix(field: &str, radix: u32) -> FinprojResult<()> {
    if !(2..=36).contains(&radix) {
        return Err(FinprojError::invalid(field, "Base must be between 2 and 36"));
    }
    Ok(())
}
