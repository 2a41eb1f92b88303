//! # pagesync
//!
//! Region synchronization engine for proofreading rendered web pages
//! against their PDF counterparts.
//!
//! Both pages are OCR'd into text regions. The engine pairs web regions
//! with pdf regions by fuzzy text similarity, forces pairs that share a
//! unique anchor token, refines borderline pairs by adjusting region
//! boundaries, and can discover repeated layouts from a single template
//! region.
//!
//! ## Quick Start
//!
//! ```
//! use pagesync::{ingest, Source, SyncEngine, SyncOptions};
//!
//! fn main() -> pagesync::Result<()> {
//!     let web = ingest::regions_from_json(
//!         Source::Web,
//!         1,
//!         r#"[{"rect": [0, 0, 300, 40], "text": "Alpha Beta invoice 12345"}]"#,
//!     )?;
//!     let pdf = ingest::regions_from_json(
//!         Source::Pdf,
//!         1,
//!         r#"[{"rect": [10, 12, 310, 50], "text": "Alpha Beta invoice 12345 (scanned)"}]"#,
//!     )?;
//!
//!     let outcome = SyncEngine::new(SyncOptions::default()).run(web, pdf)?;
//!     println!("sync rate: {:.1}%", outcome.stats.sync_percent());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Ratcliff/Obershelp similarity** over NFC-normalized text
//! - **Greedy matching** with a parallel similarity matrix (Rayon)
//! - **Anchor overrides** for unique identifiers such as invoice numbers
//! - **Boundary refinement** by merging split regions or trimming noise
//! - **Structure propagation** from a template over raw OCR words
//! - **Export** as per-region rows in JSON or CSV

pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod layout;
pub mod matcher;
pub mod model;
pub mod propagate;

// Re-export commonly used types
pub use engine::{PropagationReport, SyncEngine, SyncInput, SyncOptions, SyncOutcome};
pub use error::{Error, Result};
pub use export::{export_rows, to_csv, to_json, ExportRow, JsonFormat, SyncReport};
pub use matcher::{
    similarity, AnchorOptions, GreedyOptions, OptimizerOptions, SimilarityOptions,
};
pub use model::{
    AreaCodeScheme, Band, BandCounts, BandThresholds, MatchOrigin, RawWord, Rect, Region, Source,
    SyncPair, SyncStats,
};
pub use propagate::{
    CancellationToken, PropagationCandidate, PropagationOptions, PropagationResult,
};

/// Synchronize two region lists with default options.
///
/// # Example
///
/// ```
/// use pagesync::{sync, Rect, Region, Source};
///
/// let web = vec![Region::new("W1", Source::Web, Rect::new(0.0, 0.0, 50.0, 10.0), "Hello")?];
/// let pdf = vec![Region::new("P1", Source::Pdf, Rect::new(0.0, 0.0, 50.0, 10.0), "Hello")?];
/// let outcome = sync(web, pdf)?;
/// assert_eq!(outcome.stats.matched_count, 1);
/// # Ok::<(), pagesync::Error>(())
/// ```
pub fn sync(web: Vec<Region>, pdf: Vec<Region>) -> Result<SyncOutcome> {
    SyncEngine::default().run(web, pdf)
}

/// Synchronize OCR JSON for both sides and render a JSON report.
pub fn sync_json(web_json: &str, pdf_json: &str, format: JsonFormat) -> Result<String> {
    let web = ingest::regions_from_json(Source::Web, 1, web_json)?;
    let pdf = ingest::regions_from_json(Source::Pdf, 1, pdf_json)?;
    let outcome = sync(web, pdf)?;
    to_json(&SyncReport::from_outcome(&outcome), format)
}
