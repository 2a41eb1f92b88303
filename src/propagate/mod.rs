//! Template-based structure propagation.
//!
//! A confirmed region acts as a template. Its words' offsets from the
//! template origin form a layout signature, and the page's raw word boxes
//! are scanned for other places where the same signature occurs.

mod budget;
mod grid;
mod structure;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::Rect;

pub use budget::{Budget, CancellationToken};
pub use grid::WordGrid;
pub use structure::StructurePropagator;

/// Options for structure propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationOptions {
    /// Position tolerance in pixels at scale 1.0 (default 8.0)
    pub position_tolerance: f32,

    /// Minimum fraction of satisfied offsets to keep a candidate (default 0.6)
    pub min_score: f32,

    /// Maximum number of returned candidates (default 20)
    pub max_candidates: usize,

    /// IoU above which two candidates overlap (default 0.5)
    pub nms_iou: f32,

    /// Credit for a word at the expected offset whose text differs (default 0.5)
    pub position_only_credit: f32,

    /// Largest accepted deviation of the local font scale from 1.0 (default 0.3)
    pub max_scale_deviation: f32,

    /// Maximum hypotheses verified per scan (default 200 000)
    pub max_iterations: u64,

    /// Wall-clock limit per scan
    pub max_duration: Option<Duration>,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            position_tolerance: 8.0,
            min_score: 0.6,
            max_candidates: 20,
            nms_iou: 0.5,
            position_only_credit: 0.5,
            max_scale_deviation: 0.3,
            max_iterations: 200_000,
            max_duration: None,
        }
    }
}

impl PropagationOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum candidate score.
    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = score.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum number of candidates.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the time budget.
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }
}

/// A repeated structure found on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationCandidate {
    /// Candidate bounding box
    pub rect: Rect,
    /// Words inside the box in reading order
    pub text: String,
    /// Fraction of template offsets satisfied, in `[0, 1]`
    pub score: f32,
}

/// Output of one propagation scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    /// Candidates, best first
    pub candidates: Vec<PropagationCandidate>,
    /// Whether the scan stopped early on its budget or a cancellation
    pub degraded: bool,
    /// Hypotheses verified
    pub iterations: u64,
}

impl PropagationResult {
    /// Whether no candidates were found.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
