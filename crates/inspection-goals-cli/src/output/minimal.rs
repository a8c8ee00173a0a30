use serde_json::Value;

/// Priority list of headline fields, first present non-null wins.
const PRIORITY_KEYS: [&str; 8] = [
    "trend_pct",
    "shortfall",
    "adjusted_target",
    "monthly_target",
    "pct_today",
    "realized_net",
    "net",
    "value",
];

/// Print just the key answer value from the output.
///
/// Lists print one line per item; objects print their headline field, else
/// their first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Array(items) => {
            for item in items {
                println!("{}", headline(item));
            }
        }
        other => println!("{}", headline(other)),
    }
}

fn headline(value: &Value) -> String {
    if let Value::Object(map) = value {
        let label = ["date", "unit"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str));
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
                return match label {
                    Some(l) => format!("{}: {}", l, format_minimal(val)),
                    None => format_minimal(val),
                };
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }
    format_minimal(value)
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
