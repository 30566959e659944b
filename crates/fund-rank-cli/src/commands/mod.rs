pub mod anchors;
pub mod dual_momentum;
pub mod eligibility;
pub mod momentum;
pub mod rank;
pub mod returns;
pub mod rolling;

use chrono::NaiveDate;
use clap::Args;
use fund_rank_core::provider::PriceHistoryProvider;
use fund_rank_core::PriceSeries;
use serde::Serialize;
use serde_json::Value;

use crate::input;
use crate::provider::{series_from_value, DirectoryProvider};

/// Where a single price history comes from.
#[derive(Args, Debug, Clone)]
pub struct SeriesSource {
    /// Path to a price history file (mfapi.in JSON or PriceSeries JSON)
    #[arg(long, conflicts_with = "data_dir")]
    pub series: Option<String>,

    /// Directory holding `<id>.json` price histories
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Fund or benchmark id (file stem in --data-dir, or series id for --series)
    #[arg(long)]
    pub id: Option<String>,
}

impl SeriesSource {
    pub fn load(&self) -> Result<PriceSeries, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.series {
            let value = input::file::read_json_value(path)?;
            let id = self.id.clone().unwrap_or_else(|| file_stem(path));
            return Ok(series_from_value(&id, &value)?);
        }
        let dir = self
            .data_dir
            .as_ref()
            .ok_or("--series or --data-dir is required")?;
        let id = self.id.as_ref().ok_or("--id is required with --data-dir")?;
        DirectoryProvider::new(dir)?
            .fetch(id)?
            .ok_or_else(|| format!("No price data for '{}' in {}", id, dir).into())
    }
}

/// Fetch every id from `--data-dir`; ids without data are returned separately.
pub fn fetch_all(
    data_dir: &Option<String>,
    symbols: &[String],
) -> Result<(Vec<PriceSeries>, Vec<String>), Box<dyn std::error::Error>> {
    let dir = data_dir
        .as_ref()
        .ok_or("--data-dir is required (or provide --input)")?;
    if symbols.is_empty() {
        return Err("--symbols is required (or provide --input)".into());
    }
    let provider = DirectoryProvider::new(dir)?;
    let mut series = Vec::with_capacity(symbols.len());
    let mut missing = Vec::new();
    for id in symbols {
        match provider.fetch(id)? {
            Some(s) => series.push(s),
            None => {
                tracing::warn!(id = %id, "no price data, skipped");
                missing.push(id.clone());
            }
        }
    }
    Ok((series, missing))
}

fn file_stem(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Rows of display strings for commands without a core table type.
#[derive(Debug, Serialize)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Serialize `result` and attach a display table for the table/csv writers.
pub fn with_table<T: Serialize, U: Serialize>(
    result: &T,
    table: &U,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = serde_json::to_value(result)?;
    if let Value::Object(ref mut map) = value {
        map.insert("table".to_string(), serde_json::to_value(table)?);
    }
    Ok(value)
}
