//! Local boundary refinement for borderline matches.
//!
//! For each matched pair below the high band, the optimizer tries a handful
//! of mutations: merge one side with its immediate unmatched neighbour, or
//! drop a fraction of leading/trailing words. The best mutation is kept only
//! when it beats the current similarity by more than `epsilon`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::alignment::Alignment;
use super::similarity::TextSimilarity;
use super::{OptimizerOptions, SimilarityOptions};
use crate::model::{BandThresholds, MatchOrigin, Rect, Region, Source};

/// A boundary change applied to one region of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Union with the preceding region in reading order
    MergeAbove {
        /// Index of the absorbed region
        neighbor: usize,
    },
    /// Union with the following region in reading order
    MergeBelow {
        /// Index of the absorbed region
        neighbor: usize,
    },
    /// Drop leading words
    TrimLeading {
        /// Number of words removed
        words: usize,
    },
    /// Drop trailing words
    TrimTrailing {
        /// Number of words removed
        words: usize,
    },
}

impl Mutation {
    /// Index of the absorbed neighbour, for merge mutations.
    pub fn neighbor(&self) -> Option<usize> {
        match self {
            Mutation::MergeAbove { neighbor } | Mutation::MergeBelow { neighbor } => {
                Some(*neighbor)
            }
            _ => None,
        }
    }
}

/// An accepted optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    /// Web index of the pair
    pub web: usize,
    /// Pdf index of the pair
    pub pdf: usize,
    /// Side whose region was changed
    pub side: Source,
    /// What was changed
    pub mutation: Mutation,
    /// Similarity before
    pub before: f32,
    /// Similarity after
    pub after: f32,
}

/// Upper bound on refinement passes per run.
const MAX_PASSES: usize = 32;

struct Proposal {
    side: Source,
    mutation: Mutation,
    text: String,
    rect: Rect,
    score: f32,
}

/// Reading-order neighbours of every region on one side.
struct Neighbors {
    above: Vec<Option<usize>>,
    below: Vec<Option<usize>>,
}

impl Neighbors {
    fn build(regions: &[Region]) -> Self {
        let mut order: Vec<usize> = (0..regions.len())
            .filter(|&i| !regions[i].is_merged())
            .collect();
        order.sort_by(|&a, &b| regions[a].reading_cmp(&regions[b]).then(a.cmp(&b)));

        let mut above = vec![None; regions.len()];
        let mut below = vec![None; regions.len()];
        for pair in order.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let same_flow = regions[first].page == regions[second].page
                && regions[first].column == regions[second].column;
            if same_flow {
                below[first] = Some(second);
                above[second] = Some(first);
            }
        }
        Self { above, below }
    }
}

/// Refines mid and low band pairs by adjusting region boundaries.
#[derive(Debug, Clone, Default)]
pub struct RangeOptimizer {
    options: OptimizerOptions,
    bands: BandThresholds,
    scorer: TextSimilarity,
}

impl RangeOptimizer {
    /// Create an optimizer.
    pub fn new(
        options: OptimizerOptions,
        bands: BandThresholds,
        similarity: SimilarityOptions,
    ) -> Self {
        Self {
            options,
            bands,
            scorer: TextSimilarity::new(similarity),
        }
    }

    /// Get the optimizer options.
    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    /// Optimize every eligible pair in web order, mutating regions in place.
    ///
    /// Passes repeat until one applies no mutation, so running the optimizer
    /// again on its own output changes nothing. A region absorbed by a merge
    /// is tagged with `merged_into` and cannot be absorbed again. Pairs that
    /// cannot be improved are left unchanged.
    pub fn optimize(
        &self,
        web: &mut [Region],
        pdf: &mut [Region],
        alignment: &mut Alignment,
    ) -> Vec<Optimization> {
        let mut applied = Vec::new();
        if !self.options.enabled {
            return applied;
        }

        for pass in 0..MAX_PASSES {
            let accepted = self.pass(web, pdf, alignment);
            if accepted.is_empty() {
                break;
            }
            log::debug!("Optimizer pass {} accepted {} mutation(s)", pass + 1, accepted.len());
            applied.extend(accepted);
        }
        applied
    }

    fn pass(
        &self,
        web: &mut [Region],
        pdf: &mut [Region],
        alignment: &mut Alignment,
    ) -> Vec<Optimization> {
        let web_neighbors = Neighbors::build(web);
        let pdf_neighbors = Neighbors::build(pdf);
        let mut consumed_web: HashSet<usize> = HashSet::new();
        let mut consumed_pdf: HashSet<usize> = HashSet::new();
        let mut applied = Vec::new();

        let links: Vec<_> = alignment.links().collect();
        for (w, link) in links {
            let before = link.similarity;
            if before <= 0.0 || before >= self.bands.high || link.origin == MatchOrigin::Anchor {
                continue;
            }
            let p = link.pdf;

            let mut proposals = Vec::new();
            if self.options.allow_merge {
                self.merge_proposals(
                    Source::Web,
                    w,
                    web,
                    &pdf[p].text,
                    &web_neighbors,
                    &consumed_web,
                    |i| alignment.is_web_linked(i),
                    &mut proposals,
                );
                self.merge_proposals(
                    Source::Pdf,
                    p,
                    pdf,
                    &web[w].text,
                    &pdf_neighbors,
                    &consumed_pdf,
                    |i| alignment.is_pdf_linked(i),
                    &mut proposals,
                );
            }
            if self.options.allow_trim {
                self.trim_proposals(Source::Web, &web[w], &pdf[p].text, &mut proposals);
                self.trim_proposals(Source::Pdf, &pdf[p], &web[w].text, &mut proposals);
            }

            let mut best: Option<Proposal> = None;
            for proposal in proposals {
                let better = best
                    .as_ref()
                    .map(|b| proposal.score > b.score)
                    .unwrap_or(true);
                if better {
                    best = Some(proposal);
                }
            }

            let Some(best) = best else { continue };
            if best.score <= before + self.options.epsilon {
                log::debug!(
                    "No improving mutation for {} <-> {} ({:.3} -> {:.3})",
                    web[w].id,
                    pdf[p].id,
                    before,
                    best.score
                );
                continue;
            }

            let (regions, consumed, owner) = match best.side {
                Source::Web => (&mut *web, &mut consumed_web, w),
                Source::Pdf => (&mut *pdf, &mut consumed_pdf, p),
            };
            regions[owner].text = best.text;
            regions[owner].rect = best.rect;
            if let Some(n) = best.mutation.neighbor() {
                let owner_id = regions[owner].id.clone();
                regions[n].merged_into = Some(owner_id);
                consumed.insert(n);
            }
            alignment.update(w, best.score, MatchOrigin::Optimized);

            log::debug!(
                "Optimized {} <-> {} via {:?} on {} ({:.3} -> {:.3})",
                web[w].id,
                pdf[p].id,
                best.mutation,
                best.side,
                before,
                best.score
            );

            applied.push(Optimization {
                web: w,
                pdf: p,
                side: best.side,
                mutation: best.mutation,
                before,
                after: best.score,
            });
        }

        applied
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_proposals(
        &self,
        side: Source,
        idx: usize,
        regions: &[Region],
        other_text: &str,
        neighbors: &Neighbors,
        consumed: &HashSet<usize>,
        is_linked: impl Fn(usize) -> bool,
        out: &mut Vec<Proposal>,
    ) {
        let region = &regions[idx];
        let available = |n: usize| {
            !consumed.contains(&n) && !regions[n].is_merged() && !is_linked(n)
        };

        if let Some(n) = neighbors.above[idx].filter(|&n| available(n)) {
            let text = join_text(&regions[n].text, &region.text);
            out.push(Proposal {
                side,
                mutation: Mutation::MergeAbove { neighbor: n },
                score: self.scorer.score(&text, other_text),
                text,
                rect: region.rect.union(&regions[n].rect),
            });
        }
        if let Some(n) = neighbors.below[idx].filter(|&n| available(n)) {
            let text = join_text(&region.text, &regions[n].text);
            out.push(Proposal {
                side,
                mutation: Mutation::MergeBelow { neighbor: n },
                score: self.scorer.score(&text, other_text),
                text,
                rect: region.rect.union(&regions[n].rect),
            });
        }
    }

    fn trim_proposals(
        &self,
        side: Source,
        region: &Region,
        other_text: &str,
        out: &mut Vec<Proposal>,
    ) {
        let words: Vec<&str> = region.text.split_whitespace().collect();
        if words.len() < 2 || self.options.trim_fraction <= 0.0 {
            return;
        }
        let count = ((words.len() as f32 * self.options.trim_fraction).ceil() as usize)
            .clamp(1, words.len() - 1);

        let leading = words[count..].join(" ");
        out.push(Proposal {
            side,
            mutation: Mutation::TrimLeading { words: count },
            score: self.scorer.score(&leading, other_text),
            text: leading,
            rect: region.rect,
        });

        let trailing = words[..words.len() - count].join(" ");
        out.push(Proposal {
            side,
            mutation: Mutation::TrimTrailing { words: count },
            score: self.scorer.score(&trailing, other_text),
            text: trailing,
            rect: region.rect,
        });
    }
}

fn join_text(first: &str, second: &str) -> String {
    match (first.trim().is_empty(), second.trim().is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{} {}", first, second),
    }
}
