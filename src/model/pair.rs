//! Sync pairs and similarity bands.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Rect, Region};

/// Similarity classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Similarity at or above the high threshold
    High,
    /// Similarity in `[mid, high)`
    Mid,
    /// Matched, but below the mid threshold
    Low,
    /// One side missing
    Unmatched,
}

impl Band {
    /// Display color used by exporters.
    pub fn color(&self) -> &'static str {
        match self {
            Band::High => "#4CAF50",
            Band::Mid => "#FFC107",
            Band::Low => "#FF9800",
            Band::Unmatched => "#F44336",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Band::High => "high",
            Band::Mid => "mid",
            Band::Low => "low",
            Band::Unmatched => "unmatched",
        };
        f.write_str(s)
    }
}

/// Cut-offs between the high, mid and low bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    /// Lower bound of the high band
    pub high: f32,
    /// Lower bound of the mid band
    pub mid: f32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            high: 0.5,
            mid: 0.3,
        }
    }
}

impl BandThresholds {
    /// Classify a pair's similarity. Pairs missing a side, or scoring zero,
    /// are unmatched.
    pub fn classify(&self, similarity: f32, matched: bool) -> Band {
        if !matched || similarity <= 0.0 {
            Band::Unmatched
        } else if similarity >= self.high {
            Band::High
        } else if similarity >= self.mid {
            Band::Mid
        } else {
            Band::Low
        }
    }
}

/// Pipeline stage that produced a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrigin {
    /// Greedy similarity assignment (also used for unmatched pairs)
    Greedy,
    /// Forced by a shared anchor token
    Anchor,
    /// Refined by the range optimizer
    Optimized,
}

/// A correspondence (or non-correspondence) between a web and a pdf region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPair {
    /// Web region id, `None` for a pdf-only pair
    pub web_id: Option<String>,
    /// Pdf region id, `None` for a web-only pair
    pub pdf_id: Option<String>,
    /// Similarity in `[0, 1]`
    pub similarity: f32,
    /// Band derived from the final similarity
    pub band: Band,
    /// Web text (empty for pdf-only pairs)
    pub web_text: String,
    /// Pdf text (empty for web-only pairs)
    pub pdf_text: String,
    /// Web bounding box
    pub web_bbox: Option<Rect>,
    /// Pdf bounding box
    pub pdf_bbox: Option<Rect>,
    /// Stage that produced the pair
    pub origin: MatchOrigin,
}

impl SyncPair {
    /// A matched pair between two regions.
    pub fn matched(
        web: &Region,
        pdf: &Region,
        similarity: f32,
        origin: MatchOrigin,
        bands: &BandThresholds,
    ) -> Self {
        let similarity = similarity.clamp(0.0, 1.0);
        Self {
            web_id: Some(web.id.clone()),
            pdf_id: Some(pdf.id.clone()),
            similarity,
            band: bands.classify(similarity, true),
            web_text: web.text.clone(),
            pdf_text: pdf.text.clone(),
            web_bbox: Some(web.rect),
            pdf_bbox: Some(pdf.rect),
            origin,
        }
    }

    /// A web-only pair.
    pub fn web_only(web: &Region) -> Self {
        Self {
            web_id: Some(web.id.clone()),
            pdf_id: None,
            similarity: 0.0,
            band: Band::Unmatched,
            web_text: web.text.clone(),
            pdf_text: String::new(),
            web_bbox: Some(web.rect),
            pdf_bbox: None,
            origin: MatchOrigin::Greedy,
        }
    }

    /// A pdf-only pair.
    pub fn pdf_only(pdf: &Region) -> Self {
        Self {
            web_id: None,
            pdf_id: Some(pdf.id.clone()),
            similarity: 0.0,
            band: Band::Unmatched,
            web_text: String::new(),
            pdf_text: pdf.text.clone(),
            web_bbox: None,
            pdf_bbox: Some(pdf.rect),
            origin: MatchOrigin::Greedy,
        }
    }

    /// Whether both sides are present.
    pub fn is_matched(&self) -> bool {
        self.web_id.is_some() && self.pdf_id.is_some()
    }
}
