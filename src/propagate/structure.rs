//! Repeated-layout search around anchor words.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;

use super::budget::{Budget, CancellationToken};
use super::grid::WordGrid;
use super::{PropagationCandidate, PropagationOptions, PropagationResult};
use crate::layout::reading_text;
use crate::model::{RawWord, Rect, Region};

/// One word of the template's layout signature.
#[derive(Debug, Clone)]
struct TemplateWord {
    key: String,
    dx: f32,
    dy: f32,
    height: f32,
}

/// Finds other occurrences of a template region's word layout.
#[derive(Debug, Clone, Default)]
pub struct StructurePropagator {
    options: PropagationOptions,
    token: Option<CancellationToken>,
}

impl StructurePropagator {
    /// Create a propagator.
    pub fn new(options: PropagationOptions) -> Self {
        Self {
            options,
            token: None,
        }
    }

    /// Attach a cancellation token checked during the scan.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Get the propagation options.
    pub fn options(&self) -> &PropagationOptions {
        &self.options
    }

    /// Scan `words` for repetitions of the template's layout.
    ///
    /// Every raw word outside the template whose text equals a template word
    /// is treated as that word, fixing a hypothetical origin and scale. The
    /// hypothesis scores the fraction of the template's word offsets that
    /// have a word nearby: full credit for the same text, partial credit for
    /// any word. An empty word list or a degenerate template gives an empty
    /// result.
    pub fn propagate(&self, template: &Region, words: &[RawWord]) -> PropagationResult {
        let frame = template.rect;
        if words.is_empty() || template.text.trim().is_empty() || frame.area() <= 0.0 {
            log::debug!("Propagation skipped for '{}': nothing to scan", template.id);
            return PropagationResult::default();
        }

        let keys: Vec<String> = words.iter().map(|w| word_key(&w.text)).collect();
        let mut inside = vec![false; words.len()];
        let mut layout = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let (cx, cy) = word.rect.center();
            if keys[i].is_empty() || !frame.contains_point(cx, cy) {
                continue;
            }
            inside[i] = true;
            layout.push(TemplateWord {
                key: keys[i].clone(),
                dx: word.rect.x1 - frame.x1,
                dy: word.rect.y1 - frame.y1,
                height: word.height(),
            });
        }
        if layout.is_empty() {
            log::debug!("Template '{}' contains no raw words", template.id);
            return PropagationResult::default();
        }

        let grid = WordGrid::build(words, (self.options.position_tolerance * 4.0).max(16.0));
        let mut budget = Budget::start(
            self.options.max_iterations,
            self.options.max_duration,
            self.token.clone(),
        );

        let mut hypotheses: Vec<(Rect, f32)> = Vec::new();
        'scan: for (i, word) in words.iter().enumerate() {
            if inside[i] || keys[i].is_empty() {
                continue;
            }
            for anchor in layout.iter().filter(|t| t.key == keys[i]) {
                if !budget.tick() {
                    break 'scan;
                }

                let scale = if anchor.height > 0.0 {
                    word.height() / anchor.height
                } else {
                    1.0
                };
                if !scale.is_finite() || (scale - 1.0).abs() > self.options.max_scale_deviation {
                    continue;
                }

                let ox = word.rect.x1 - anchor.dx * scale;
                let oy = word.rect.y1 - anchor.dy * scale;
                let rect = Rect::new(
                    ox,
                    oy,
                    ox + frame.width() * scale,
                    oy + frame.height() * scale,
                );
                if rect.iou(&frame) > self.options.nms_iou {
                    continue;
                }

                let score = self.verify(&layout, words, &keys, &grid, ox, oy, scale);
                if score >= self.options.min_score {
                    hypotheses.push((rect, score));
                }
            }
        }

        let degraded = budget.is_exhausted();
        if degraded {
            log::warn!(
                "Propagation for '{}' stopped after {} hypotheses; results are partial",
                template.id,
                budget.iterations()
            );
        }

        let candidates = self
            .suppress(hypotheses)
            .into_iter()
            .map(|(rect, score)| {
                let contained: Vec<&RawWord> = words
                    .iter()
                    .filter(|w| {
                        let (cx, cy) = w.rect.center();
                        rect.contains_point(cx, cy)
                    })
                    .collect();
                PropagationCandidate {
                    rect,
                    text: reading_text(&contained),
                    score,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Template '{}': {} candidate(s) from {} hypotheses",
            template.id,
            candidates.len(),
            budget.iterations()
        );

        PropagationResult {
            candidates,
            degraded,
            iterations: budget.iterations(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn verify(
        &self,
        layout: &[TemplateWord],
        words: &[RawWord],
        keys: &[String],
        grid: &WordGrid,
        ox: f32,
        oy: f32,
        scale: f32,
    ) -> f32 {
        let tolerance = self.options.position_tolerance * scale;
        let mut credit = 0.0;
        for expected in layout {
            let near = grid.near(
                words,
                ox + expected.dx * scale,
                oy + expected.dy * scale,
                tolerance,
            );
            if near.iter().any(|&j| keys[j] == expected.key) {
                credit += 1.0;
            } else if !near.is_empty() {
                credit += self.options.position_only_credit;
            }
        }
        (credit / layout.len() as f32).clamp(0.0, 1.0)
    }

    /// Keep the best of each overlapping group, best first, up to the cap.
    fn suppress(&self, mut hypotheses: Vec<(Rect, f32)>) -> Vec<(Rect, f32)> {
        hypotheses.sort_by(|(ra, sa), (rb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then(ra.y1.partial_cmp(&rb.y1).unwrap_or(Ordering::Equal))
                .then(ra.x1.partial_cmp(&rb.x1).unwrap_or(Ordering::Equal))
        });

        let mut kept: Vec<(Rect, f32)> = Vec::new();
        for (rect, score) in hypotheses {
            if kept.len() >= self.options.max_candidates {
                break;
            }
            if kept.iter().all(|(k, _)| k.iou(&rect) <= self.options.nms_iou) {
                kept.push((rect, score));
            }
        }
        kept
    }
}

fn word_key(text: &str) -> String {
    text.trim().nfc().collect()
}
