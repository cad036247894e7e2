use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_series, scalar_text};

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result go in one Field/Value table (nested
/// objects flattened to `parent.child`); each per-period series gets a
/// table of its own below it.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_object(value),
        },
        Value::Array(arr) => print_series(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    print_object(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", scalar_text(value));
        return;
    };

    let mut rows = Vec::new();
    let mut series = Vec::new();
    collect(None, map, &mut rows, &mut series);

    if !rows.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in rows {
            builder.push_record([key, val]);
        }
        println!("{}", Table::from(builder));
    }

    for (name, items) in series {
        println!("\n{}:", name);
        print_series(items);
    }
}

fn collect<'a>(
    prefix: Option<&str>,
    map: &'a Map<String, Value>,
    rows: &mut Vec<(String, String)>,
    series: &mut Vec<(String, &'a [Value])>,
) {
    for (key, val) in map {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match val {
            Value::Object(inner) => collect(Some(&name), inner, rows, series),
            Value::Array(items) if is_series(val) => series.push((name, items)),
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_text).collect();
                rows.push((name, joined.join(", ")));
            }
            Value::Null => rows.push((name, "-".to_string())),
            _ => rows.push((name, scalar_text(val))),
        }
    }
}

fn print_series(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar_text(item));
        }
    }
}
