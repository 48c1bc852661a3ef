use serde_json::Value;

/// Key result fields, most specific first. A loan-terms run prints its total
/// payable, a classify run its `current` flag, a report its principal total.
const PRIORITY_KEYS: [&str; 7] = [
    "total_payable",
    "outstanding_balance",
    "current",
    "in_arrears",
    "outstanding",
    "total_principal",
    "total_payments",
];

/// Print just the key answer value from the output.
///
/// Lists print their row count. Objects print the first non-null priority
/// field, then fall back to the first field of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal(value));
}

fn minimal(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Array(rows) => rows.len().to_string(),
        Value::Object(map) => PRIORITY_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map(format_minimal)
            .or_else(|| {
                map.iter()
                    .next()
                    .map(|(key, val)| format!("{}: {}", key, format_minimal(val)))
            })
            .unwrap_or_default(),
        other => format_minimal(other),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
