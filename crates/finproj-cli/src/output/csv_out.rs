use serde_json::Value;
use std::io;

use super::{is_series, result_of, scalar_text};

/// Write output as CSV to stdout.
///
/// A result carrying a per-period series (schedule, yearly rows,
/// snapshots) is written as that series, one row per period; otherwise
/// a two-column field/value listing of the scalar fields.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    match result {
        Value::Object(map) => match map.values().find(|v| is_series(v)) {
            Some(Value::Array(rows)) => write_series(&mut wtr, rows),
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    if !val.is_array() && !val.is_object() {
                        let _ = wtr.write_record([key.as_str(), &scalar_text(val)]);
                    }
                }
            }
        },
        Value::Array(rows) => write_series(&mut wtr, rows),
        _ => {
            let _ = wtr.write_record([&scalar_text(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_series<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&scalar_text(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
