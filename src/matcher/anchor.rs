//! Anchor-token override matching.
//!
//! An anchor token is a long token (invoice numbers, proper nouns, dates)
//! that occurs in exactly one region on its side. When the same token shows
//! up once on each side, the two owning regions are force-paired even if
//! their bodies are otherwise dissimilar.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::alignment::Alignment;
use super::similarity::{char_ratio, ratio_upper_bound, TextSimilarity};
use super::{AnchorOptions, SimilarityOptions};
use crate::model::{MatchOrigin, Region};

const TOKEN_PATTERN: &str = r"[\p{L}\p{N}#@$%&][\p{L}\p{N}#@$%&./:_\-]*";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex"))
}

/// A token that identifies exactly one region on its side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorToken {
    /// Comparison key (NFC, case-folded unless case-sensitive)
    pub key: String,
    /// Token as it appears in the region text
    pub text: String,
    /// Index of the owning region
    pub region: usize,
}

impl AnchorToken {
    /// Token length in characters.
    pub fn len(&self) -> usize {
        self.key.chars().count()
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// A forced pairing produced by the anchor stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorMatch {
    /// Web region index
    pub web: usize,
    /// Pdf region index
    pub pdf: usize,
    /// Web-side token text
    pub token: String,
    /// Body similarity of the two regions before the override
    pub body_similarity: f32,
    /// Whether the greedy pass had already paired these regions
    pub agreed: bool,
}

#[derive(Debug, Clone)]
struct Candidate {
    web: usize,
    pdf: usize,
    token: String,
    token_len: usize,
    body_similarity: f32,
}

/// Forces pairings between regions that share a unique anchor token.
#[derive(Debug, Clone, Default)]
pub struct AnchorMatcher {
    options: AnchorOptions,
    scorer: TextSimilarity,
}

impl AnchorMatcher {
    /// Create an anchor matcher. `similarity` configures the body score
    /// used to break ties between competing anchors.
    pub fn new(options: AnchorOptions, similarity: SimilarityOptions) -> Self {
        Self {
            options,
            scorer: TextSimilarity::new(similarity),
        }
    }

    /// Get the matcher options.
    pub fn options(&self) -> &AnchorOptions {
        &self.options
    }

    /// Tokens of at least `min_token_len` characters that occur in exactly
    /// one region. Merged regions contribute no tokens.
    ///
    /// Output is ordered by region index, then first appearance.
    pub fn extract_tokens(&self, regions: &[Region]) -> Vec<AnchorToken> {
        let mut per_region: Vec<Vec<(String, String)>> = Vec::with_capacity(regions.len());
        let mut owners: HashMap<String, HashSet<usize>> = HashMap::new();

        for (idx, region) in regions.iter().enumerate() {
            let mut tokens = Vec::new();
            if !region.is_merged() {
                let mut seen = HashSet::new();
                for m in token_regex().find_iter(&region.text) {
                    let text = m.as_str().trim_end_matches(&['.', '/', ':', '_', '-'][..]);
                    let key = self.token_key(text);
                    if key.chars().count() < self.options.min_token_len {
                        continue;
                    }
                    owners.entry(key.clone()).or_default().insert(idx);
                    if seen.insert(key.clone()) {
                        tokens.push((key, text.to_string()));
                    }
                }
            }
            per_region.push(tokens);
        }

        let mut anchors = Vec::new();
        for (idx, tokens) in per_region.into_iter().enumerate() {
            for (key, text) in tokens {
                if owners.get(&key).is_some_and(|o| o.len() == 1) {
                    anchors.push(AnchorToken {
                        key,
                        text,
                        region: idx,
                    });
                }
            }
        }
        anchors
    }

    /// Apply anchor overrides to an alignment.
    ///
    /// Competing anchors for the same region are resolved by longer token
    /// first, then higher body similarity, then lower web and pdf index.
    /// Regions that lose their partner become unmatched.
    pub fn apply(
        &self,
        web: &[Region],
        pdf: &[Region],
        alignment: &mut Alignment,
    ) -> Vec<AnchorMatch> {
        if !self.options.enabled {
            return Vec::new();
        }

        let web_tokens = self.extract_tokens(web);
        let pdf_tokens = self.extract_tokens(pdf);
        if web_tokens.is_empty() || pdf_tokens.is_empty() {
            log::debug!(
                "Anchor stage skipped: {} web / {} pdf qualifying tokens",
                web_tokens.len(),
                pdf_tokens.len()
            );
            return Vec::new();
        }

        let mut candidates = self.collect_candidates(web, pdf, &web_tokens, &pdf_tokens);
        candidates.sort_by(|a, b| {
            b.token_len
                .cmp(&a.token_len)
                .then(
                    b.body_similarity
                        .partial_cmp(&a.body_similarity)
                        .unwrap_or(Ordering::Equal),
                )
                .then(a.web.cmp(&b.web))
                .then(a.pdf.cmp(&b.pdf))
        });

        let mut claimed_web = HashSet::new();
        let mut claimed_pdf = HashSet::new();
        let mut matches = Vec::new();

        for candidate in candidates {
            if claimed_web.contains(&candidate.web) || claimed_pdf.contains(&candidate.pdf) {
                continue;
            }
            claimed_web.insert(candidate.web);
            claimed_pdf.insert(candidate.pdf);

            let agreed = alignment.link_of(candidate.web).map(|l| l.pdf) == Some(candidate.pdf);
            let (orphan_web, orphan_pdf) = alignment.link(
                candidate.web,
                candidate.pdf,
                self.options.confidence,
                MatchOrigin::Anchor,
            );
            log::debug!(
                "Anchor '{}' pins {} <-> {} (agreed: {}, orphaned web {:?}, pdf {:?})",
                candidate.token,
                web[candidate.web].id,
                pdf[candidate.pdf].id,
                agreed,
                orphan_web.map(|w| &web[w].id),
                orphan_pdf.map(|p| &pdf[p].id)
            );

            matches.push(AnchorMatch {
                web: candidate.web,
                pdf: candidate.pdf,
                token: candidate.token,
                body_similarity: candidate.body_similarity,
                agreed,
            });
        }

        matches
    }

    fn collect_candidates(
        &self,
        web: &[Region],
        pdf: &[Region],
        web_tokens: &[AnchorToken],
        pdf_tokens: &[AnchorToken],
    ) -> Vec<Candidate> {
        let threshold = self.options.near_equal_threshold;
        let pdf_chars: Vec<Vec<char>> = pdf_tokens.iter().map(|t| t.key.chars().collect()).collect();

        // BTreeMap keeps candidate order independent of hashing.
        let mut best: BTreeMap<(usize, usize), Candidate> = BTreeMap::new();

        for wt in web_tokens {
            let w_chars: Vec<char> = wt.key.chars().collect();
            for (pt, p_chars) in pdf_tokens.iter().zip(&pdf_chars) {
                let equal = wt.key == pt.key;
                if !equal {
                    if threshold >= 1.0
                        || ratio_upper_bound(w_chars.len(), p_chars.len()) < threshold
                        || char_ratio(&w_chars, p_chars) < threshold
                    {
                        continue;
                    }
                }

                let token_len = w_chars.len().min(p_chars.len());
                let key = (wt.region, pt.region);
                let replace = best
                    .get(&key)
                    .map(|existing| token_len > existing.token_len)
                    .unwrap_or(true);
                if replace {
                    let body_similarity = match best.get(&key) {
                        Some(existing) => existing.body_similarity,
                        None => self.scorer.score(&web[wt.region].text, &pdf[pt.region].text),
                    };
                    best.insert(
                        key,
                        Candidate {
                            web: wt.region,
                            pdf: pt.region,
                            token: wt.text.clone(),
                            token_len,
                            body_similarity,
                        },
                    );
                }
            }
        }

        best.into_values().collect()
    }

    fn token_key(&self, token: &str) -> String {
        let normalized: String = token.nfc().collect();
        if self.options.case_sensitive {
            normalized
        } else {
            normalized.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::GreedyMatcher;
    use crate::model::{Rect, Source};

    fn region(source: Source, idx: usize, text: &str) -> Region {
        let y = idx as f32 * 40.0;
        Region::new(
            format!("{}{}", source.id_prefix(), idx + 1),
            source,
            Rect::new(0.0, y, 300.0, y + 30.0),
            text,
        )
        .unwrap()
    }

    fn side(source: Source, texts: &[&str]) -> Vec<Region> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| region(source, i, t))
            .collect()
    }

    #[test]
    fn test_extract_tokens_unique_and_long() {
        let regions = side(
            Source::Web,
            &["Invoice #A1234 due March", "Invoice reminder", "short words"],
        );
        let tokens = AnchorMatcher::default().extract_tokens(&regions);
        let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();

        // "invoice" is shared by two regions, "march" is too short
        assert_eq!(keys, vec!["#a1234", "reminder"]);
        assert_eq!(tokens[0].region, 0);
        assert_eq!(tokens[0].text, "#A1234");
    }

    #[test]
    fn test_extract_tokens_strips_trailing_punctuation() {
        let regions = side(Source::Pdf, &["ref #A1234, processed."]);
        let tokens = AnchorMatcher::default().extract_tokens(&regions);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["#A1234", "processed"]);
    }

    #[test]
    fn test_anchor_overrides_unmatched_pair() {
        let web = side(Source::Web, &["Invoice #A1234 due March"]);
        let pdf = side(Source::Pdf, &["Payment record, ref #A1234, processed"]);

        let greedy = GreedyMatcher::new(
            crate::matcher::GreedyOptions::new().with_threshold(0.5),
            Default::default(),
        );
        let mut alignment = greedy.match_regions(&web, &pdf);
        assert_eq!(alignment.matched_count(), 0);

        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].agreed);

        let link = alignment.link_of(0).unwrap();
        assert_eq!(link.pdf, 0);
        assert_eq!(link.origin, MatchOrigin::Anchor);
        assert_eq!(link.similarity, 0.95);
    }

    #[test]
    fn test_anchor_pins_agreeing_greedy_link() {
        let web = side(Source::Web, &["Invoice #A1234 due March"]);
        let pdf = side(Source::Pdf, &["Payment record, ref #A1234, processed"]);

        let greedy = GreedyMatcher::new(
            crate::matcher::GreedyOptions::new().with_threshold(0.3),
            Default::default(),
        );
        let mut alignment = greedy.match_regions(&web, &pdf);
        let before = alignment.link_of(0).unwrap();
        assert_eq!(before.pdf, 0);
        assert_eq!(before.origin, MatchOrigin::Greedy);
        assert!(before.similarity < 0.5);

        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].agreed);

        let link = alignment.link_of(0).unwrap();
        assert_eq!(link.pdf, 0);
        assert_eq!(link.origin, MatchOrigin::Anchor);
        assert_eq!(link.similarity, 0.95);
        assert_eq!(alignment.matched_count(), 1);
    }

    #[test]
    fn test_anchor_replaces_disagreeing_greedy_link() {
        let web = side(Source::Web, &["Order ZX-99812 shipped", "Order status pending"]);
        let pdf = side(Source::Pdf, &["Order status pending!", "Tracking: ZX-99812"]);

        let mut alignment = Alignment::new(2, 2);
        alignment.link(0, 0, 0.4, MatchOrigin::Greedy);

        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 2);

        // The longer "ZX-99812" anchor is applied first and moves web 0 to pdf 1;
        // "pending" then pairs the orphaned pdf 0 with web 1.
        assert_eq!(alignment.link_of(0).map(|l| l.pdf), Some(1));
        assert_eq!(alignment.link_of(1).map(|l| l.pdf), Some(0));
        assert_eq!(matches[0].token, "ZX-99812");
    }

    #[test]
    fn test_anchor_conflict_prefers_longer_token() {
        // Web region 0 shares "ALPHA77" with pdf 0 and "BETA-12345" with pdf 1.
        let web = side(Source::Web, &["ALPHA77 and BETA-12345"]);
        let pdf = side(Source::Pdf, &["ALPHA77 only", "BETA-12345 only"]);
        let mut alignment = Alignment::new(1, 2);

        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pdf, 1);
        assert_eq!(matches[0].token, "BETA-12345");
    }

    #[test]
    fn test_anchor_conflict_tie_prefers_body_similarity() {
        let web = side(Source::Web, &["Ref QWERTY12 final"]);
        let pdf = side(Source::Pdf, &["QWERTY12 unrelated", "Ref QWERTY13 final"]);
        // "qwerty12" vs "qwerty13" is 0.875 < 0.9, so only pdf 0 qualifies.
        let mut alignment = Alignment::new(1, 2);
        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pdf, 0);

        // With a looser threshold both qualify with equal length; the
        // body-similar region wins.
        let loose = AnchorMatcher::new(
            AnchorOptions::new().with_near_equal_threshold(0.8),
            Default::default(),
        );
        let mut alignment = Alignment::new(1, 2);
        let matches = loose.apply(&web, &pdf, &mut alignment);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pdf, 1);
    }

    #[test]
    fn test_anchor_skips_without_tokens() {
        let web = side(Source::Web, &["a b c"]);
        let pdf = side(Source::Pdf, &["Something longer"]);
        let mut alignment = Alignment::new(1, 1);
        let matches = AnchorMatcher::default().apply(&web, &pdf, &mut alignment);
        assert!(matches.is_empty());
        assert_eq!(alignment.matched_count(), 0);
    }

    #[test]
    fn test_anchor_disabled() {
        let web = side(Source::Web, &["Invoice #A1234"]);
        let pdf = side(Source::Pdf, &["ref #A1234"]);
        let matcher = AnchorMatcher::new(AnchorOptions::disabled(), Default::default());
        let mut alignment = Alignment::new(1, 1);
        assert!(matcher.apply(&web, &pdf, &mut alignment).is_empty());
    }
}
