//! Normalized fuzzy text similarity.
//!
//! The score is the Ratcliff/Obershelp ratio: find the longest common block,
//! recurse into the unmatched pieces on both sides, and return
//! `2 * M / (len(a) + len(b))` where `M` is the total matched length.
//! Lengths are counted in Unicode scalar values after normalization.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use super::SimilarityOptions;

/// Similarity with default options (NFC, collapsed whitespace, case-sensitive).
///
/// Both empty gives 1.0, exactly one empty gives 0.0.
///
/// ```
/// use pagesync::matcher::similarity;
///
/// assert_eq!(similarity("abcd", "abcd"), 1.0);
/// assert_eq!(similarity("", ""), 1.0);
/// assert_eq!(similarity("abc", ""), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f32 {
    TextSimilarity::default().score(a, b)
}

/// Similarity where absent text counts as the empty string.
pub fn similarity_opt(a: Option<&str>, b: Option<&str>) -> f32 {
    similarity(a.unwrap_or(""), b.unwrap_or(""))
}

/// Configured similarity scorer.
#[derive(Debug, Clone, Default)]
pub struct TextSimilarity {
    options: SimilarityOptions,
}

impl TextSimilarity {
    /// Create a scorer with the given options.
    pub fn new(options: SimilarityOptions) -> Self {
        Self { options }
    }

    /// Get the scorer options.
    pub fn options(&self) -> &SimilarityOptions {
        &self.options
    }

    /// Score two strings in `[0, 1]`.
    pub fn score(&self, a: &str, b: &str) -> f32 {
        let a = self.prepare(a);
        let b = self.prepare(b);
        char_ratio(&a, &b)
    }

    /// Normalize a string into the character sequence that gets compared.
    pub fn prepare(&self, text: &str) -> Vec<char> {
        let normalized: String = if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        };

        let folded = if self.options.case_sensitive {
            normalized
        } else {
            normalized.to_lowercase()
        };

        if self.options.collapse_whitespace {
            let mut out = Vec::with_capacity(folded.len());
            for word in folded.split_whitespace() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.extend(word.chars());
            }
            out
        } else {
            folded.chars().collect()
        }
    }
}

/// Ratio over already-prepared character sequences.
pub fn char_ratio(a: &[char], b: &[char]) -> f32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matched = matched_len(a, b);
    (2 * matched) as f32 / total as f32
}

/// Best score two sequences of these lengths could reach.
pub fn ratio_upper_bound(len_a: usize, len_b: usize) -> f32 {
    let total = len_a + len_b;
    if total == 0 {
        return 1.0;
    }
    (2 * len_a.min(len_b)) as f32 / total as f32
}

/// Total length of the matching blocks between `a` and `b`.
pub fn matched_len(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, len)`. Among blocks of equal length the one starting
/// earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    let mut new_j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        new_j2len.clear();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_j2len.insert(j, k);
                if k > best_len {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_len = k;
                }
            }
        }
        std::mem::swap(&mut j2len, &mut new_j2len);
    }

    (best_i, best_j, best_len)
}
