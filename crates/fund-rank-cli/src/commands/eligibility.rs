use std::collections::BTreeMap;

use clap::Args;
use fund_rank_core::eligibility::{
    filter_eligible, EligibilityCandidate, EligibilityCriteria, ExcludedFund, DEFAULT_MIN_HISTORY_DAYS,
};
use fund_rank_core::provider::collect_entities;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{with_table, DisplayTable};
use crate::input;
use crate::provider::DirectoryProvider;

/// Arguments for the eligibility pre-filter
#[derive(Args)]
pub struct EligibilityArgs {
    /// Path to a JSON document `{"candidates": [...], "criteria": {...}}` (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Directory holding `<id>.json` price histories
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Comma-separated fund ids
    #[arg(long, value_delimiter = ',')]
    pub funds: Vec<String>,

    /// Minimum calendar days between first and last price
    #[arg(long, default_value_t = DEFAULT_MIN_HISTORY_DAYS)]
    pub min_history_days: i64,

    /// Minimum fund size; funds without a known size fail this check
    #[arg(long)]
    pub min_fund_size: Option<Decimal>,

    /// Path to a JSON object of fund sizes by id
    #[arg(long)]
    pub sizes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EligibilityDocument {
    candidates: Vec<EligibilityCandidate>,
    #[serde(default)]
    criteria: EligibilityCriteria,
}

#[derive(Debug, Serialize)]
struct EligibilityOutput {
    criteria: EligibilityCriteria,
    eligible: Vec<String>,
    excluded: Vec<ExcludedFund>,
}

pub fn run_eligibility(args: EligibilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<EligibilityDocument>(&args.input)? {
        Some(doc) => doc,
        None => {
            let dir = args
                .data_dir
                .as_ref()
                .ok_or("--data-dir is required (or provide --input)")?;
            if args.funds.is_empty() {
                return Err("--funds is required (or provide --input)".into());
            }
            let sizes: BTreeMap<String, Decimal> = match &args.sizes {
                Some(path) => input::file::read_json(path)?,
                None => BTreeMap::new(),
            };
            let provider = DirectoryProvider::new(dir)?;
            EligibilityDocument {
                candidates: collect_entities(&provider, &args.funds)
                    .into_iter()
                    .map(|entity| EligibilityCandidate {
                        fund_size: sizes.get(&entity.id).copied(),
                        entity,
                    })
                    .collect(),
                criteria: EligibilityCriteria {
                    min_history_days: args.min_history_days,
                    min_fund_size: args.min_fund_size,
                },
            }
        }
    };

    let report = filter_eligible(doc.candidates, &doc.criteria)?;

    let mut rows: Vec<Vec<String>> = report
        .eligible
        .iter()
        .map(|e| vec![e.id.clone(), e.display_name().to_string(), "eligible".to_string()])
        .collect();
    rows.extend(
        report
            .excluded
            .iter()
            .map(|e| vec![e.id.clone(), String::new(), e.reason.describe()]),
    );
    let table = DisplayTable {
        headers: vec!["Id".to_string(), "Name".to_string(), "Status".to_string()],
        rows,
    };

    let output = EligibilityOutput {
        criteria: doc.criteria,
        eligible: report.eligible_ids().iter().map(|s| s.to_string()).collect(),
        excluded: report.excluded,
    };
    with_table(&output, &table)
}
