//! Greedy best-first pairing by text similarity.

use rayon::prelude::*;

use super::alignment::Alignment;
use super::similarity::{char_ratio, TextSimilarity};
use super::{GreedyOptions, SimilarityOptions};
use crate::model::{MatchOrigin, Region};

/// Pairs each web region, in input order, with its most similar unconsumed
/// pdf region.
///
/// Ties go to the lowest pdf index. Regions already merged into another
/// region are left out of the assignment.
#[derive(Debug, Clone, Default)]
pub struct GreedyMatcher {
    options: GreedyOptions,
    scorer: TextSimilarity,
}

impl GreedyMatcher {
    /// Create a matcher.
    pub fn new(options: GreedyOptions, similarity: SimilarityOptions) -> Self {
        Self {
            options,
            scorer: TextSimilarity::new(similarity),
        }
    }

    /// Get the matcher options.
    pub fn options(&self) -> &GreedyOptions {
        &self.options
    }

    /// Similarity of every web region (rows) against every pdf region (columns).
    ///
    /// Rows are computed in parallel for large matrices; the result does not
    /// depend on whether the parallel path was taken.
    pub fn similarity_matrix(&self, web: &[Region], pdf: &[Region]) -> Vec<Vec<f32>> {
        let web_chars: Vec<Vec<char>> = web.iter().map(|r| self.scorer.prepare(&r.text)).collect();
        let pdf_chars: Vec<Vec<char>> = pdf.iter().map(|r| self.scorer.prepare(&r.text)).collect();

        let row = |a: &Vec<char>| -> Vec<f32> {
            pdf_chars.iter().map(|b| char_ratio(a, b)).collect()
        };

        let cells = web.len().saturating_mul(pdf.len());
        if self.options.parallel && cells >= self.options.parallel_min_cells {
            log::debug!(
                "Computing {}x{} similarity matrix in parallel",
                web.len(),
                pdf.len()
            );
            web_chars.par_iter().map(row).collect()
        } else {
            web_chars.iter().map(row).collect()
        }
    }

    /// Run the greedy pass.
    pub fn match_regions(&self, web: &[Region], pdf: &[Region]) -> Alignment {
        let matrix = self.similarity_matrix(web, pdf);
        self.assign(web, pdf, &matrix)
    }

    /// Sequential assignment over a precomputed matrix.
    pub fn assign(&self, web: &[Region], pdf: &[Region], matrix: &[Vec<f32>]) -> Alignment {
        let mut alignment = Alignment::new(web.len(), pdf.len());
        let mut consumed: Vec<bool> = pdf.iter().map(|r| r.is_merged()).collect();

        for (w, region) in web.iter().enumerate() {
            if region.is_merged() {
                continue;
            }

            let mut best: Option<(usize, f32)> = None;
            for (p, &score) in matrix[w].iter().enumerate() {
                if consumed[p] {
                    continue;
                }
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((p, score)),
                }
            }

            if let Some((p, score)) = best {
                if score > 0.0 && score >= self.options.threshold {
                    alignment.link(w, p, score, MatchOrigin::Greedy);
                    consumed[p] = true;
                }
            }
        }

        log::debug!(
            "Greedy pass matched {} of {} web regions (threshold {:.2})",
            alignment.matched_count(),
            web.len(),
            self.options.threshold
        );

        alignment
    }
}
