//! Per-region export rows and the serialized report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{PropagationReport, SyncOutcome};
use crate::model::{Band, Rect, Region, Source, SyncPair, SyncStats};

/// One row per region, as consumed by spreadsheet exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// Region id
    pub id: String,
    /// Side of the region
    pub source: Source,
    /// Region text
    pub text: String,
    /// Region box
    pub rect: Rect,
    /// Page number
    pub page: u32,
    /// Similarity of the region's pair, 0.0 when unmatched
    pub similarity: f32,
    /// Band color
    pub color: String,
    /// Band of the region's pair
    pub band: Band,
    /// Display label
    pub area_code: Option<String>,
    /// Id of the matched region on the other side
    pub partner_id: Option<String>,
}

impl ExportRow {
    fn new(region: &Region, pair: Option<&SyncPair>) -> Self {
        let (similarity, band, partner_id) = match pair {
            Some(pair) if pair.is_matched() => {
                let partner = match region.source {
                    Source::Web => pair.pdf_id.clone(),
                    Source::Pdf => pair.web_id.clone(),
                };
                (pair.similarity, pair.band, partner)
            }
            _ => (0.0, Band::Unmatched, None),
        };
        Self {
            id: region.id.clone(),
            source: region.source,
            text: region.text.clone(),
            rect: region.rect,
            page: region.page,
            similarity,
            color: band.color().to_string(),
            band,
            area_code: region.area_code.clone(),
            partner_id,
        }
    }
}

/// Rows for every web region in order, then every pdf region in order.
pub fn export_rows(outcome: &SyncOutcome) -> Vec<ExportRow> {
    let mut by_web: HashMap<&str, &SyncPair> = HashMap::new();
    let mut by_pdf: HashMap<&str, &SyncPair> = HashMap::new();
    for pair in &outcome.pairs {
        if let Some(id) = pair.web_id.as_deref() {
            by_web.insert(id, pair);
        }
        if let Some(id) = pair.pdf_id.as_deref() {
            by_pdf.insert(id, pair);
        }
    }

    let web = outcome
        .web
        .iter()
        .map(|r| ExportRow::new(r, by_web.get(r.id.as_str()).copied()));
    let pdf = outcome
        .pdf
        .iter()
        .map(|r| ExportRow::new(r, by_pdf.get(r.id.as_str()).copied()));
    web.chain(pdf).collect()
}

/// Everything a host needs to present or archive one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Report creation time
    pub generated_at: DateTime<Utc>,
    /// Aggregate statistics
    pub stats: SyncStats,
    /// Pair list
    pub pairs: Vec<SyncPair>,
    /// Per-region rows
    pub rows: Vec<ExportRow>,
    /// Propagation per template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub propagation: Vec<PropagationReport>,
}

impl SyncReport {
    /// Build a report stamped with the current time.
    pub fn from_outcome(outcome: &SyncOutcome) -> Self {
        Self {
            generated_at: Utc::now(),
            stats: outcome.stats.clone(),
            pairs: outcome.pairs.clone(),
            rows: export_rows(outcome),
            propagation: outcome.propagation.clone(),
        }
    }
}
