//! Index-level assignment between web and pdf regions.
//!
//! Every stage works on an [`Alignment`] of list indices. Pairs are only
//! materialized at the end of a run, so a region can never be linked twice.

use crate::model::{BandThresholds, MatchOrigin, Region, SyncPair};

/// One web-to-pdf link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Index into the pdf region list
    pub pdf: usize,
    /// Similarity of the link
    pub similarity: f32,
    /// Stage that created the link
    pub origin: MatchOrigin,
}

/// Exclusive one-to-one assignment of web indices to pdf indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    links: Vec<Option<Link>>,
    pdf_owner: Vec<Option<usize>>,
}

impl Alignment {
    /// Create an empty alignment for lists of the given sizes.
    pub fn new(web_len: usize, pdf_len: usize) -> Self {
        Self {
            links: vec![None; web_len],
            pdf_owner: vec![None; pdf_len],
        }
    }

    /// Number of web slots.
    pub fn web_len(&self) -> usize {
        self.links.len()
    }

    /// Number of pdf slots.
    pub fn pdf_len(&self) -> usize {
        self.pdf_owner.len()
    }

    /// Link `web` to `pdf`, dropping any link either side had before.
    ///
    /// Returns the indices that lost their partner as `(web, pdf)`.
    pub fn link(
        &mut self,
        web: usize,
        pdf: usize,
        similarity: f32,
        origin: MatchOrigin,
    ) -> (Option<usize>, Option<usize>) {
        let mut orphaned_pdf = None;
        let mut orphaned_web = None;

        if let Some(old) = self.links[web] {
            if old.pdf != pdf {
                self.pdf_owner[old.pdf] = None;
                orphaned_pdf = Some(old.pdf);
            }
        }
        if let Some(owner) = self.pdf_owner[pdf] {
            if owner != web {
                self.links[owner] = None;
                orphaned_web = Some(owner);
            }
        }

        self.links[web] = Some(Link {
            pdf,
            similarity: similarity.clamp(0.0, 1.0),
            origin,
        });
        self.pdf_owner[pdf] = Some(web);
        (orphaned_web, orphaned_pdf)
    }

    /// Remove the link of a web index, if any.
    pub fn unlink_web(&mut self, web: usize) -> Option<Link> {
        let link = self.links[web].take()?;
        self.pdf_owner[link.pdf] = None;
        Some(link)
    }

    /// Update the similarity and origin of an existing link.
    pub fn update(&mut self, web: usize, similarity: f32, origin: MatchOrigin) {
        if let Some(link) = self.links[web].as_mut() {
            link.similarity = similarity.clamp(0.0, 1.0);
            link.origin = origin;
        }
    }

    /// The link of a web index.
    pub fn link_of(&self, web: usize) -> Option<Link> {
        self.links.get(web).copied().flatten()
    }

    /// The web index owning a pdf index.
    pub fn owner_of(&self, pdf: usize) -> Option<usize> {
        self.pdf_owner.get(pdf).copied().flatten()
    }

    /// Whether a web index is linked.
    pub fn is_web_linked(&self, web: usize) -> bool {
        self.link_of(web).is_some()
    }

    /// Whether a pdf index is linked.
    pub fn is_pdf_linked(&self, pdf: usize) -> bool {
        self.owner_of(pdf).is_some()
    }

    /// Iterate `(web, link)` over linked web indices in order.
    pub fn links(&self) -> impl Iterator<Item = (usize, Link)> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(w, link)| link.map(|l| (w, l)))
    }

    /// Number of linked pairs.
    pub fn matched_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_some()).count()
    }

    /// Build the pair list: one pair per web region in input order, then
    /// pdf-only pairs in input order. Bands are derived from the final
    /// similarity.
    pub fn to_pairs(
        &self,
        web: &[Region],
        pdf: &[Region],
        bands: &BandThresholds,
    ) -> Vec<SyncPair> {
        let mut pairs = Vec::with_capacity(web.len() + pdf.len());

        for (w, region) in web.iter().enumerate() {
            match self.link_of(w) {
                Some(link) => pairs.push(SyncPair::matched(
                    region,
                    &pdf[link.pdf],
                    link.similarity,
                    link.origin,
                    bands,
                )),
                None => pairs.push(SyncPair::web_only(region)),
            }
        }

        for (p, region) in pdf.iter().enumerate() {
            if !self.is_pdf_linked(p) {
                pairs.push(SyncPair::pdf_only(region));
            }
        }

        pairs
    }
}
