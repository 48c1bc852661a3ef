use super::row_columns;
use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// Row lists become one record per row. A result object is written as
/// field/value pairs, or as its first row list when it has one (report
/// loans, for example).
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result(&mut wtr, result),
            Some(Value::Array(rows)) => write_rows(&mut wtr, rows),
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Map<String, Value>) {
    let rows = result.values().find_map(|v| match v {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => Some(items),
        _ => None,
    });
    match rows {
        Some(rows) => write_rows(wtr, rows),
        None => write_fields(wtr, result),
    }
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if arr.first().is_some_and(Value::is_object) {
        let headers = row_columns(arr);
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut csv::Writer<Vec<u8>>)) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        f(&mut wtr);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_report_writes_its_loan_rows() {
        let result = json!({
            "total_principal": "1000",
            "loans": [
                { "customer_name": "Ana Rojas", "principal": "1000", "loan": { "id": "x" } }
            ]
        });
        let out = render(|w| write_result(w, result.as_object().unwrap()));
        assert_eq!(out, "customer_name,principal\nAna Rojas,1000\n");
    }

    #[test]
    fn test_optional_fields_missing_from_first_row_still_written() {
        let rows = [
            json!({ "id": "a", "principal": "1000" }),
            json!({ "id": "b", "principal": "500", "collateral": "Moto" }),
        ];
        let out = render(|w| write_rows(w, &rows));
        assert_eq!(out, "collateral,id,principal\n,a,1000\nMoto,b,500\n");
    }

    #[test]
    fn test_scalar_result_as_fields() {
        let result = json!({ "total_payable": "1102.50" });
        let out = render(|w| write_result(w, result.as_object().unwrap()));
        assert_eq!(out, "field,value\ntotal_payable,1102.50\n");
    }
}
