pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A display table attached by a command: `{"table": {"headers": [..], "rows": [[..]]}}`.
pub struct DisplayRows<'a> {
    pub headers: Vec<&'a str>,
    pub rows: Vec<Vec<&'a str>>,
}

pub fn display_rows(value: &Value) -> Option<DisplayRows<'_>> {
    let table = value.get("table")?;
    let headers = table
        .get("headers")?
        .as_array()?
        .iter()
        .map(|h| h.as_str().unwrap_or_default())
        .collect();
    let rows = table
        .get("rows")?
        .as_array()?
        .iter()
        .filter_map(|r| r.as_array())
        .map(|r| r.iter().map(|c| c.as_str().unwrap_or_default()).collect())
        .collect();
    Some(DisplayRows { headers, rows })
}
