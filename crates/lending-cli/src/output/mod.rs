pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;
use std::collections::BTreeSet;

/// Dispatch a command's result to the selected formatter on stdout.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Column names for a list of row objects: every key seen in any row, in
/// key order. Keys holding a nested object in any row are left out.
pub(crate) fn row_columns(rows: &[Value]) -> Vec<String> {
    let mut columns = BTreeSet::new();
    let mut nested = BTreeSet::new();
    for map in rows.iter().filter_map(Value::as_object) {
        for (key, val) in map {
            if val.is_object() {
                nested.insert(key.as_str());
            } else {
                columns.insert(key.as_str());
            }
        }
    }
    columns
        .difference(&nested)
        .map(|k| k.to_string())
        .collect()
}
