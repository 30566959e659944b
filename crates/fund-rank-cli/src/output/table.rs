use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::display_rows;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(display) = display_rows(value) {
        let mut builder = Builder::default();
        builder.push_record(display.headers);
        for row in display.rows {
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
        print_notes(value);
        return;
    }

    match value {
        Value::Object(_) => print_flat_object(value),
        Value::Array(arr) => {
            for item in arr {
                println!("{}", format_value(item));
            }
        }
        _ => println!("{}", value),
    }
}

/// Warnings and methodology from a computation envelope, if present.
fn print_notes(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
