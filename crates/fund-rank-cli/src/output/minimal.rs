use serde_json::Value;

use super::display_rows;

/// Print just the key answer.
///
/// Tables print their first two columns (name and rank for rankings); other
/// outputs print the first well-known field, else the first field.
pub fn print_minimal(value: &Value) {
    if let Some(display) = display_rows(value) {
        for row in &display.rows {
            println!("{}", row.iter().take(2).copied().collect::<Vec<_>>().join("\t"));
        }
        return;
    }

    let priority_keys = ["first_anchor", "anchors", "eligible", "simple"];

    if let Value::Object(map) = value {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(value));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        Value::Array(arr) => arr.iter().map(format_minimal).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => match map.get("value") {
            Some(v) => format_minimal(v),
            None => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}
