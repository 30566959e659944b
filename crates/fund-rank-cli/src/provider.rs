use std::fs;
use std::path::{Path, PathBuf};

use fund_rank_core::provider::{parse_mfapi_history, PriceHistoryProvider};
use fund_rank_core::{FundRankError, FundRankResult, PriceSeries};
use serde_json::Value;

/// Price histories stored as `<dir>/<id>.json`.
///
/// A file may be an mfapi.in NAV document or a serialized `PriceSeries`.
/// A missing file means the provider has no data for that id.
pub struct DirectoryProvider {
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(format!("Data directory not found: {}", dir.display()).into());
        }
        Ok(Self { dir })
    }

    /// Ids are plain file stems; anything that could leave the directory is
    /// rejected.
    fn path_for(&self, id: &str) -> FundRankResult<PathBuf> {
        let traversal = id.is_empty()
            || id.contains(['/', '\\'])
            || id == "."
            || id == ".."
            || Path::new(id).is_absolute();
        if traversal {
            return Err(FundRankError::InvalidArgument {
                field: "id".into(),
                reason: format!("'{id}' is not a valid fund id"),
            });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl PriceHistoryProvider for DirectoryProvider {
    fn fetch(&self, id: &str) -> FundRankResult<Option<PriceSeries>> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Ok(None);
        }
        let value = read_value(&path)?;
        series_from_value(id, &value).map(Some)
    }
}

fn read_value(path: &Path) -> FundRankResult<Value> {
    let contents = fs::read_to_string(path).map_err(|e| {
        FundRankError::SerializationError(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Accept either document shape: mfapi (`data` rows) or `PriceSeries` (`points`).
pub fn series_from_value(id: &str, value: &Value) -> FundRankResult<PriceSeries> {
    if value.get("data").is_some() {
        return parse_mfapi_history(id, value);
    }
    Ok(serde_json::from_value(value.clone())?)
}
