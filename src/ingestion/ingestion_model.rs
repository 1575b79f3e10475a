use serde::{Deserialize, Serialize};

use crate::assets::assets_model::Asset;
use crate::prices::prices_model::PriceObservation;

/// How a single ingestion attempt concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestOutcome {
    /// A live provider observation was written
    Live,
    /// The provider failed; the last known price was carried forward
    Fallback,
    /// An identical observation already existed, nothing was written
    Skipped,
}

/// Result of one per-asset ingestion attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub asset: Asset,
    pub outcome: IngestOutcome,
    /// The stored observation; absent when the attempt was a no-op
    pub observation: Option<PriceObservation>,
}

/// Batch report for a discovery run. A symbol can appear in more than one
/// list, e.g. created and then failed when its first fetch found no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    /// Number of symbols the provider listing returned
    pub total_candidates: usize,
    pub created: Vec<String>,
    pub priced: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl DiscoveryReport {
    pub fn new(total_candidates: usize) -> Self {
        Self {
            total_candidates,
            created: Vec::new(),
            priced: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Batch report for a refresh run over tracked assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub total_assets: usize,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl RefreshReport {
    pub fn new(total_assets: usize) -> Self {
        Self {
            total_assets,
            updated: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}
