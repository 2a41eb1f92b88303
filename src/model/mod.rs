//! Data model shared by every stage of the synchronization pipeline.
//!
//! Regions are created once per run from OCR output and are never deleted
//! while matching. Sync pairs are recomputed from scratch on every run.

mod geometry;
mod pair;
mod region;
mod stats;

pub use geometry::Rect;
pub use pair::{Band, BandThresholds, MatchOrigin, SyncPair};
pub use region::{validate_regions, AreaCodeScheme, RawWord, Region, Source};
pub use stats::{BandCounts, SyncStats};
