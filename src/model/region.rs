//! Regions and raw OCR words.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use super::Rect;
use crate::error::{Error, Result};

/// Which rendered page a region was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Rendered web page screenshot
    Web,
    /// Rasterized PDF page
    Pdf,
}

impl Source {
    /// Prefix used for generated identifiers (`W1`, `P1`, ...).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Source::Web => "W",
            Source::Pdf => "P",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Web => write!(f, "web"),
            Source::Pdf => write!(f, "pdf"),
        }
    }
}

/// A rectangular, text-bearing block detected on one source's page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Identifier, unique within its source
    pub id: String,

    /// Side this region belongs to
    pub source: Source,

    /// Bounding box in the source image's pixel space
    pub rect: Rect,

    /// Recognized text
    pub text: String,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Column index (0 = leftmost)
    #[serde(default)]
    pub column: u32,

    /// Display label assigned by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,

    /// Id of the region this one was merged into by the optimizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,
}

fn default_page() -> u32 {
    1
}

impl Region {
    /// Create a validated region on page 1, column 0.
    pub fn new(
        id: impl Into<String>,
        source: Source,
        rect: Rect,
        text: impl Into<String>,
    ) -> Result<Self> {
        let region = Self {
            id: id.into(),
            source,
            rect,
            text: text.into(),
            page: 1,
            column: 0,
            area_code: None,
            merged_into: None,
        };
        region.validate()?;
        Ok(region)
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the column index.
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = column;
        self
    }

    /// Fail with [`Error::InvalidRegion`] when the rectangle is degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.rect.is_degenerate() {
            return Err(Error::InvalidRegion {
                side: self.source,
                id: self.id.clone(),
                rect: self.rect,
            });
        }
        Ok(())
    }

    /// Whether the optimizer absorbed this region into another one.
    pub fn is_merged(&self) -> bool {
        self.merged_into.is_some()
    }

    /// Reading-order comparison: page, column, top edge, left edge.
    pub fn reading_cmp(&self, other: &Region) -> Ordering {
        self.page
            .cmp(&other.page)
            .then(self.column.cmp(&other.column))
            .then(
                self.rect
                    .y1
                    .partial_cmp(&other.rect.y1)
                    .unwrap_or(Ordering::Equal),
            )
            .then(
                self.rect
                    .x1
                    .partial_cmp(&other.rect.x1)
                    .unwrap_or(Ordering::Equal),
            )
    }
}

/// Validate every region of one side: non-degenerate, matching source, unique ids.
pub fn validate_regions(source: Source, regions: &[Region]) -> Result<()> {
    let mut seen = HashSet::with_capacity(regions.len());
    for region in regions {
        if region.source != source {
            return Err(Error::Other(format!(
                "Region '{}' is tagged {} but was supplied as {}",
                region.id, region.source, source
            )));
        }
        region.validate()?;
        if !seen.insert(region.id.as_str()) {
            return Err(Error::DuplicateRegionId {
                side: source,
                id: region.id.clone(),
            });
        }
    }
    Ok(())
}

/// A single OCR word box, not yet clustered into regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWord {
    /// Word bounding box
    pub rect: Rect,
    /// Word text
    pub text: String,
}

impl RawWord {
    /// Create a raw word.
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }

    /// Word height, used as a font-size proxy.
    pub fn height(&self) -> f32 {
        self.rect.height()
    }
}

/// How display labels (`area_code`) are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AreaCodeScheme {
    /// `"{prefix}-{sequence}"`, sequence 1-based in reading order
    Sequence {
        /// Prefix for web regions
        web_prefix: String,
        /// Prefix for pdf regions
        pdf_prefix: String,
    },
    /// `"Col{column}-{id}"`
    Column,
}

impl Default for AreaCodeScheme {
    fn default() -> Self {
        AreaCodeScheme::Sequence {
            web_prefix: "W".to_string(),
            pdf_prefix: "P".to_string(),
        }
    }
}

impl AreaCodeScheme {
    /// Assign `area_code` to every region of one side.
    pub fn assign(&self, regions: &mut [Region]) {
        match self {
            AreaCodeScheme::Sequence {
                web_prefix,
                pdf_prefix,
            } => {
                let mut order: Vec<usize> = (0..regions.len()).collect();
                order.sort_by(|&a, &b| regions[a].reading_cmp(&regions[b]).then(a.cmp(&b)));
                for (seq, idx) in order.into_iter().enumerate() {
                    let prefix = match regions[idx].source {
                        Source::Web => web_prefix,
                        Source::Pdf => pdf_prefix,
                    };
                    regions[idx].area_code = Some(format!("{}-{}", prefix, seq + 1));
                }
            }
            AreaCodeScheme::Column => {
                for region in regions.iter_mut() {
                    region.area_code = Some(format!("Col{}-{}", region.column, region.id));
                }
            }
        }
    }
}
