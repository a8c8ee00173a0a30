use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, row_headers};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    match result {
        Value::Object(res_map) => {
            // Scalars first as a field/value table, then one table per list
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            let mut nested: Vec<(&String, &Value)> = Vec::new();
            for (key, val) in res_map {
                if is_row_list(val) || val.is_object() {
                    nested.push((key, val));
                } else {
                    builder.push_record([key.as_str(), &cell(val, "-")]);
                }
            }
            println!("{}", Table::from(builder));
            for (key, val) in nested {
                print_section(Some(key.as_str()), val);
            }
        }
        other => print_section(None, other),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    if let Some(t) = title {
        println!("\n{}:", t);
    }
    match value {
        Value::Array(arr) => print_array_table(arr),
        Value::Object(map) => print_flat_object(map),
        other => println!("{}", cell(other, "-")),
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
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

fn is_row_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &cell(val, "-")]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if arr.first().is_some_and(Value::is_object) {
        let headers = row_headers(arr);
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(|v| cell(v, "-")).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", cell(item, "-"));
        }
    }
}
