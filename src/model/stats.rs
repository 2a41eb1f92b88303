//! Aggregate statistics over a synchronization run.

use serde::{Deserialize, Serialize};

use super::{Band, MatchOrigin, SyncPair};

/// Number of pairs in each band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    /// High-band pairs
    pub high: u32,
    /// Mid-band pairs
    pub mid: u32,
    /// Low-band pairs
    pub low: u32,
    /// Unmatched pairs (either side)
    pub unmatched: u32,
}

impl BandCounts {
    /// Increment the counter for a band.
    pub fn add(&mut self, band: Band) {
        match band {
            Band::High => self.high += 1,
            Band::Mid => self.mid += 1,
            Band::Low => self.low += 1,
            Band::Unmatched => self.unmatched += 1,
        }
    }

    /// Total pairs counted.
    pub fn total(&self) -> u32 {
        self.high + self.mid + self.low + self.unmatched
    }
}

/// Statistics consumed by sync-rate displays and exporters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Pairs with both sides present
    pub matched_count: u32,

    /// Web regions taking part in the run
    pub total_web_regions: u32,

    /// Pdf regions taking part in the run
    pub total_pdf_regions: u32,

    /// `matched_count / total_web_regions`, 0.0 when there are no web regions
    pub sync_rate: f32,

    /// Pairs per band
    pub band_counts: BandCounts,

    /// Pairs forced by anchor tokens
    pub anchor_count: u32,

    /// Pairs refined by the optimizer
    pub optimized_count: u32,

    /// Regions appended by structure propagation
    pub propagated_count: u32,

    /// Whether any propagation ran out of budget
    pub propagation_degraded: bool,
}

impl SyncStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute statistics from a finished pair list.
    pub fn from_pairs(pairs: &[SyncPair], total_web: usize, total_pdf: usize) -> Self {
        let mut stats = Self {
            total_web_regions: total_web as u32,
            total_pdf_regions: total_pdf as u32,
            ..Default::default()
        };
        for pair in pairs {
            stats.add_pair(pair);
        }
        stats.sync_rate = if total_web > 0 {
            stats.matched_count as f32 / total_web as f32
        } else {
            0.0
        };
        stats
    }

    /// Count one pair.
    pub fn add_pair(&mut self, pair: &SyncPair) {
        self.band_counts.add(pair.band);
        if pair.is_matched() {
            self.matched_count += 1;
            match pair.origin {
                MatchOrigin::Anchor => self.anchor_count += 1,
                MatchOrigin::Optimized => self.optimized_count += 1,
                MatchOrigin::Greedy => {}
            }
        }
    }

    /// Sync rate as a percentage rounded to one decimal.
    pub fn sync_percent(&self) -> f32 {
        (self.sync_rate * 1000.0).round() / 10.0
    }
}
