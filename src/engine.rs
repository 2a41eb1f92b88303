//! Synchronization pipeline.
//!
//! # Example
//!
//! ```
//! use pagesync::{Rect, Region, Source, SyncEngine, SyncOptions};
//!
//! fn main() -> pagesync::Result<()> {
//!     let web = vec![Region::new(
//!         "W1",
//!         Source::Web,
//!         Rect::new(0.0, 0.0, 100.0, 20.0),
//!         "Alpha Beta invoice 12345",
//!     )?];
//!     let pdf = vec![Region::new(
//!         "P1",
//!         Source::Pdf,
//!         Rect::new(0.0, 0.0, 100.0, 20.0),
//!         "Alpha Beta invoice 12345 (scanned)",
//!     )?];
//!
//!     let outcome = SyncEngine::new(SyncOptions::default()).run(web, pdf)?;
//!     assert_eq!(outcome.stats.matched_count, 1);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout;
use crate::matcher::{
    AnchorMatch, AnchorMatcher, AnchorOptions, GreedyMatcher, GreedyOptions, Optimization,
    OptimizerOptions, RangeOptimizer, SimilarityOptions, TextSimilarity,
};
use crate::model::{
    validate_regions, AreaCodeScheme, BandThresholds, RawWord, Region, Source, SyncPair,
    SyncStats,
};
use crate::propagate::{
    CancellationToken, PropagationOptions, PropagationResult, StructurePropagator,
};

/// Options for a full synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Text similarity normalization
    pub similarity: SimilarityOptions,

    /// Greedy matching
    pub greedy: GreedyOptions,

    /// Band cut-offs
    pub bands: BandThresholds,

    /// Anchor overrides
    pub anchor: AnchorOptions,

    /// Boundary refinement
    pub optimizer: OptimizerOptions,

    /// Structure propagation
    pub propagation: PropagationOptions,

    /// Display label scheme
    pub area_codes: AreaCodeScheme,

    /// Detect columns before matching
    pub infer_columns: bool,
}

impl SyncOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the greedy acceptance threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.greedy = self.greedy.with_threshold(threshold);
        self
    }

    /// Set similarity options.
    pub fn with_similarity(mut self, options: SimilarityOptions) -> Self {
        self.similarity = options;
        self
    }

    /// Set greedy options.
    pub fn with_greedy(mut self, options: GreedyOptions) -> Self {
        self.greedy = options;
        self
    }

    /// Set band thresholds.
    pub fn with_bands(mut self, bands: BandThresholds) -> Self {
        self.bands = bands;
        self
    }

    /// Set anchor options.
    pub fn with_anchor(mut self, options: AnchorOptions) -> Self {
        self.anchor = options;
        self
    }

    /// Set optimizer options.
    pub fn with_optimizer(mut self, options: OptimizerOptions) -> Self {
        self.optimizer = options;
        self
    }

    /// Set propagation options.
    pub fn with_propagation(mut self, options: PropagationOptions) -> Self {
        self.propagation = options;
        self
    }

    /// Set the area code scheme.
    pub fn with_area_codes(mut self, scheme: AreaCodeScheme) -> Self {
        self.area_codes = scheme;
        self
    }

    /// Enable or disable column inference.
    pub fn with_infer_columns(mut self, infer: bool) -> Self {
        self.infer_columns = infer;
        self
    }
}

/// Everything one run consumes.
#[derive(Debug, Clone, Default)]
pub struct SyncInput {
    /// Web regions
    pub web: Vec<Region>,
    /// Pdf regions
    pub pdf: Vec<Region>,
    /// Raw web words, needed only for propagation
    pub web_words: Option<Vec<RawWord>>,
    /// Raw pdf words, needed only for propagation
    pub pdf_words: Option<Vec<RawWord>>,
    /// Web region ids to propagate
    pub web_templates: Vec<String>,
    /// Pdf region ids to propagate
    pub pdf_templates: Vec<String>,
}

impl SyncInput {
    /// Input with regions only.
    pub fn new(web: Vec<Region>, pdf: Vec<Region>) -> Self {
        Self {
            web,
            pdf,
            ..Default::default()
        }
    }

    /// Attach raw web words.
    pub fn with_web_words(mut self, words: Vec<RawWord>) -> Self {
        self.web_words = Some(words);
        self
    }

    /// Attach raw pdf words.
    pub fn with_pdf_words(mut self, words: Vec<RawWord>) -> Self {
        self.pdf_words = Some(words);
        self
    }

    /// Propagate a web region as a template.
    pub fn with_web_template(mut self, id: impl Into<String>) -> Self {
        self.web_templates.push(id.into());
        self
    }

    /// Propagate a pdf region as a template.
    pub fn with_pdf_template(mut self, id: impl Into<String>) -> Self {
        self.pdf_templates.push(id.into());
        self
    }
}

/// What propagation did for one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Side of the template
    pub side: Source,
    /// Template region id
    pub template_id: String,
    /// Ids of the regions appended
    pub added: Vec<String>,
    /// Candidates found before overlap filtering
    pub candidates: usize,
    /// Whether the scan stopped early
    pub degraded: bool,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// One pair per web region in input order, then pdf-only pairs
    pub pairs: Vec<SyncPair>,
    /// Web regions after propagation, refinement and labelling
    pub web: Vec<Region>,
    /// Pdf regions after propagation, refinement and labelling
    pub pdf: Vec<Region>,
    /// Aggregate statistics
    pub stats: SyncStats,
    /// Anchor overrides that were applied
    pub anchors: Vec<AnchorMatch>,
    /// Boundary refinements that were accepted
    pub optimizations: Vec<Optimization>,
    /// Propagation per template
    pub propagation: Vec<PropagationReport>,
}

/// Runs propagation, greedy matching, anchor overrides and refinement in a
/// fixed order.
///
/// A run is deterministic for a given input. Running again on a previous
/// outcome's regions applies no further refinement and reproduces the
/// regions, partners, similarities and bands. Origins describe the run that
/// produced them, so a pair refined earlier comes back as
/// [`MatchOrigin::Greedy`](crate::MatchOrigin::Greedy) and
/// `stats.optimized_count` counts only this run's refinements.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    options: SyncOptions,
    cancellation: Option<CancellationToken>,
}

impl SyncEngine {
    /// Create an engine.
    pub fn new(options: SyncOptions) -> Self {
        Self {
            options,
            cancellation: None,
        }
    }

    /// Attach a cancellation token for propagation scans.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Get the engine options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Similarity of two strings under the engine's options.
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        TextSimilarity::new(self.options.similarity.clone()).score(a, b)
    }

    /// Run on regions only.
    pub fn run(&self, web: Vec<Region>, pdf: Vec<Region>) -> Result<SyncOutcome> {
        self.run_input(SyncInput::new(web, pdf))
    }

    /// Scan raw words for repetitions of one template region.
    pub fn propagate(&self, template: &Region, words: &[RawWord]) -> PropagationResult {
        self.propagator().propagate(template, words)
    }

    /// Run the full pipeline.
    pub fn run_input(&self, input: SyncInput) -> Result<SyncOutcome> {
        let SyncInput {
            mut web,
            mut pdf,
            web_words,
            pdf_words,
            web_templates,
            pdf_templates,
        } = input;

        validate_regions(Source::Web, &web)?;
        validate_regions(Source::Pdf, &pdf)?;

        if self.options.infer_columns {
            layout::infer_columns(&mut web);
            layout::infer_columns(&mut pdf);
        }

        let mut propagation = self.propagate_side(
            Source::Web,
            &mut web,
            web_words.as_deref(),
            &web_templates,
        )?;
        propagation.extend(self.propagate_side(
            Source::Pdf,
            &mut pdf,
            pdf_words.as_deref(),
            &pdf_templates,
        )?);

        let greedy = GreedyMatcher::new(self.options.greedy.clone(), self.options.similarity.clone());
        let mut alignment = greedy.match_regions(&web, &pdf);

        let anchor = AnchorMatcher::new(self.options.anchor.clone(), self.options.similarity.clone());
        let anchors = anchor.apply(&web, &pdf, &mut alignment);

        let optimizer = RangeOptimizer::new(
            self.options.optimizer.clone(),
            self.options.bands,
            self.options.similarity.clone(),
        );
        let optimizations = optimizer.optimize(&mut web, &mut pdf, &mut alignment);

        self.options.area_codes.assign(&mut web);
        self.options.area_codes.assign(&mut pdf);

        let pairs = alignment.to_pairs(&web, &pdf, &self.options.bands);
        let mut stats = SyncStats::from_pairs(&pairs, web.len(), pdf.len());
        stats.propagated_count = propagation.iter().map(|r| r.added.len() as u32).sum();
        stats.propagation_degraded = propagation.iter().any(|r| r.degraded);

        log::info!(
            "Synced {}/{} web regions against {} pdf regions ({:.1}%): {} high, {} mid, {} low, {} unmatched",
            stats.matched_count,
            stats.total_web_regions,
            stats.total_pdf_regions,
            stats.sync_percent(),
            stats.band_counts.high,
            stats.band_counts.mid,
            stats.band_counts.low,
            stats.band_counts.unmatched
        );

        Ok(SyncOutcome {
            pairs,
            web,
            pdf,
            stats,
            anchors,
            optimizations,
            propagation,
        })
    }

    /// Run on a blocking worker thread.
    #[cfg(feature = "async")]
    pub async fn run_blocking(self, input: SyncInput) -> Result<SyncOutcome> {
        tokio::task::spawn_blocking(move || self.run_input(input))
            .await
            .map_err(|e| Error::Other(format!("Sync task failed: {}", e)))?
    }

    fn propagator(&self) -> StructurePropagator {
        let propagator = StructurePropagator::new(self.options.propagation.clone());
        match &self.cancellation {
            Some(token) => propagator.with_cancellation(token.clone()),
            None => propagator,
        }
    }

    /// Append propagated regions for every template on one side.
    fn propagate_side(
        &self,
        side: Source,
        regions: &mut Vec<Region>,
        words: Option<&[RawWord]>,
        templates: &[String],
    ) -> Result<Vec<PropagationReport>> {
        let mut reports = Vec::with_capacity(templates.len());
        if templates.is_empty() {
            return Ok(reports);
        }

        let propagator = self.propagator();
        for template_id in templates {
            let template = regions
                .iter()
                .find(|r| &r.id == template_id)
                .cloned()
                .ok_or_else(|| Error::UnknownTemplate {
                    side,
                    id: template_id.clone(),
                })?;

            let Some(words) = words else {
                log::debug!("No raw {} words; skipping template '{}'", side, template_id);
                reports.push(PropagationReport {
                    side,
                    template_id: template_id.clone(),
                    added: Vec::new(),
                    candidates: 0,
                    degraded: false,
                });
                continue;
            };

            let result = propagator.propagate(&template, words);
            let mut added = Vec::new();
            let mut sequence = 0;
            for candidate in &result.candidates {
                let overlaps = regions
                    .iter()
                    .any(|r| r.rect.iou(&candidate.rect) > self.options.propagation.nms_iou);
                if overlaps {
                    log::debug!(
                        "Skipping candidate {} of '{}': overlaps an existing region",
                        candidate.rect,
                        template_id
                    );
                    continue;
                }

                let id = loop {
                    sequence += 1;
                    let id = format!("{}-r{}", template_id, sequence);
                    if !regions.iter().any(|r| r.id == id) {
                        break id;
                    }
                };
                let region = Region::new(id.clone(), side, candidate.rect, candidate.text.clone())?
                    .with_page(template.page)
                    .with_column(template.column);
                regions.push(region);
                added.push(id);
            }

            reports.push(PropagationReport {
                side,
                template_id: template_id.clone(),
                added,
                candidates: result.candidates.len(),
                degraded: result.degraded,
            });
        }
        Ok(reports)
    }
}
