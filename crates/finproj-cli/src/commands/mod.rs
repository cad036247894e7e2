pub mod commission;
pub mod conversions;
pub mod housing;
pub mod lending;
pub mod physical;
pub mod projection;
pub mod share;

use serde::de::DeserializeOwned;

use finproj_core::share::{self as link, Shareable};

use crate::input;

/// Parse a snake_case enum value (`month`, `gallon_us`, `celsius`) the way
/// its JSON form is spelled. Dashes are accepted for underscores.
pub(crate) fn parse_named<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    let name = s.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(name.clone()))
        .map_err(|_| format!("unknown value '{}'", name))
}

/// Input for a shareable calculator: `--input` file, then `--query`, then
/// stdin. `None` means fall back to individual flags.
pub(crate) fn load_shareable<T: Shareable>(
    path: Option<&str>,
    query: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if path.is_none() {
        if let Some(q) = query {
            return Ok(Some(link::from_query_string(q)?));
        }
    }
    input::from_file_or_stdin(path)
}

/// Flag value, or an error naming the missing flag.
pub(crate) fn required<T>(value: Option<T>, flag: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("--{} is required (or provide --input)", flag))
}
