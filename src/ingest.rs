//! OCR output ingestion.
//!
//! Regions arrive as `[{"rect": [x1, y1, x2, y2], "text": "...", "id": "...",
//! "column": 0, "page": 1}]` where everything except `rect` is optional.
//! Raw words arrive as `[{"rect": [...], "text": "..."}]`.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::model::{validate_regions, RawWord, Rect, Region, Source};

#[derive(Debug, Deserialize)]
struct RegionRecord {
    rect: Rect,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default)]
    page: Option<u32>,
}

/// Parse and validate one side's regions.
///
/// Regions without an id get `"{W|P}{n}"`, `n` being the 1-based input
/// position. `page` applies to records that carry no page of their own.
pub fn regions_from_json(source: Source, page: u32, json: &str) -> Result<Vec<Region>> {
    let records: Vec<RegionRecord> = serde_json::from_str(json)?;
    build_regions(source, page, records)
}

/// Like [`regions_from_json`], reading from any reader.
pub fn regions_from_reader<R: Read>(source: Source, page: u32, reader: R) -> Result<Vec<Region>> {
    let records: Vec<RegionRecord> = serde_json::from_reader(reader)?;
    build_regions(source, page, records)
}

/// Like [`regions_from_json`], reading a file.
pub fn regions_from_path<P: AsRef<Path>>(source: Source, page: u32, path: P) -> Result<Vec<Region>> {
    let json = fs::read_to_string(path)?;
    regions_from_json(source, page, &json)
}

fn build_regions(source: Source, page: u32, records: Vec<RegionRecord>) -> Result<Vec<Region>> {
    let mut regions = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("{}{}", source.id_prefix(), i + 1));
        let region = Region::new(id, source, record.rect, record.text.unwrap_or_default())?
            .with_page(record.page.unwrap_or(page))
            .with_column(record.column.unwrap_or(0));
        regions.push(region);
    }
    validate_regions(source, &regions)?;
    log::debug!("Ingested {} {} regions", regions.len(), source);
    Ok(regions)
}

/// Parse raw OCR words. Words with degenerate boxes are dropped.
pub fn words_from_json(json: &str) -> Result<Vec<RawWord>> {
    let words: Vec<RawWord> = serde_json::from_str(json)?;
    Ok(keep_valid_words(words))
}

/// Like [`words_from_json`], reading a file.
pub fn words_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawWord>> {
    let json = fs::read_to_string(path)?;
    words_from_json(&json)
}

fn keep_valid_words(words: Vec<RawWord>) -> Vec<RawWord> {
    let total = words.len();
    let kept: Vec<RawWord> = words
        .into_iter()
        .filter(|w| !w.rect.is_degenerate())
        .collect();
    if kept.len() < total {
        log::debug!("Dropped {} raw words with degenerate boxes", total - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_regions_from_json_generates_ids() {
        let json = r#"[
            {"rect": [0, 0, 100, 20], "text": "first"},
            {"rect": [0, 30, 100, 50], "text": "second", "id": "custom", "column": 1, "page": 3}
        ]"#;
        let regions = regions_from_json(Source::Pdf, 2, json).unwrap();
        assert_eq!(regions[0].id, "P1");
        assert_eq!(regions[0].page, 2);
        assert_eq!(regions[1].id, "custom");
        assert_eq!(regions[1].column, 1);
        assert_eq!(regions[1].page, 3);
        assert_eq!(regions[1].rect, Rect::new(0.0, 30.0, 100.0, 50.0));
    }

    #[test]
    fn test_regions_from_json_rejects_degenerate() {
        let json = r#"[{"rect": [10, 10, 5, 20], "text": "bad"}]"#;
        assert!(matches!(
            regions_from_json(Source::Web, 1, json),
            Err(Error::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_regions_from_json_rejects_duplicates() {
        let json = r#"[
            {"rect": [0, 0, 10, 10], "text": "a", "id": "W2"},
            {"rect": [0, 20, 10, 30], "text": "b"}
        ]"#;
        assert!(matches!(
            regions_from_json(Source::Web, 1, json),
            Err(Error::DuplicateRegionId { .. })
        ));
    }

    #[test]
    fn test_regions_from_json_malformed() {
        assert!(matches!(
            regions_from_json(Source::Web, 1, "{not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_words_from_json() {
        let json = r#"[
            {"rect": [0, 0, 10, 10], "text": "ok"},
            {"rect": [0, 0, 0, 10], "text": "flat"}
        ]"#;
        let words = words_from_json(json).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "ok");
    }

    #[test]
    fn test_regions_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web.json");
        std::fs::write(&path, r#"[{"rect": [0, 0, 10, 10], "text": "hi"}]"#).unwrap();
        let regions = regions_from_path(Source::Web, 1, &path).unwrap();
        assert_eq!(regions[0].id, "W1");
    }
}
