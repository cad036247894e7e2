use serde_json::Value;

use super::{result_of, scalar_text};

// Headline field of each calculator, most specific first (an APR result
// also carries a payment).
const PRIORITY_KEYS: [&str; 12] = [
    "apr",
    "monthly_payment",
    "payment",
    "commission",
    "cheaper",
    "converted",
    "heat_index_f",
    "rate",
    "break_even_period",
    "total_cost",
    "query",
    "json",
];

/// Print just the headline value of a result.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = result_of(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return scalar_text(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar_text(val));
        }
    }

    scalar_text(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apr_wins_over_payment() {
        let v = json!({"result": {"payment": "322.67", "apr": "0.0712"}});
        assert_eq!(headline(&v), "0.0712");
    }

    #[test]
    fn test_null_break_even_is_skipped() {
        let v = json!({"result": {"break_even_period": null, "total_cost": "100"}});
        assert_eq!(headline(&v), "100");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({"result": {"voltage": "12"}});
        assert_eq!(headline(&v), "voltage: 12");
    }
}
