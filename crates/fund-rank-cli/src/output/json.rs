use serde_json::Value;

/// Pretty-print JSON to stdout. The display `table` a command attaches is
/// dropped: JSON consumers get the exact numbers, not formatted strings.
pub fn print_json(value: &Value) {
    let value = match value {
        Value::Object(map) if map.contains_key("table") => {
            let mut map = map.clone();
            map.remove("table");
            Value::Object(map)
        }
        _ => value.clone(),
    };
    match serde_json::to_string_pretty(&value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}
