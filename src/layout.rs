//! Page layout helpers: column gutters and line grouping.
//!
//! Coordinates are image pixels with y growing downward.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{RawWord, Rect, Region};

/// Slice width used when scanning for gutters.
const SLICE_WIDTH: f32 = 3.0;
/// Pages narrower than this are always single-column.
const MIN_PAGE_WIDTH: f32 = 250.0;
/// Minimum empty band that counts as a gutter.
const MIN_GUTTER_WIDTH: f32 = 12.0;
/// Minimum width of each column on either side of a gutter.
const MIN_COLUMN_WIDTH: f32 = 80.0;
/// Words whose top edges differ by less than this fraction of their height share a line.
const LINE_TOLERANCE: f32 = 0.3;

/// A detected column in the page layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Left boundary X coordinate
    pub left: f32,
    /// Right boundary X coordinate
    pub right: f32,
    /// Column index (0 = leftmost)
    pub index: u32,
}

impl Column {
    fn single(min_x: f32, max_x: f32) -> Self {
        Self {
            left: min_x - 10.0,
            right: max_x + 10.0,
            index: 0,
        }
    }

    /// Check if an X coordinate falls within this column.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// A rect belongs to a column if its horizontal center is inside it.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        self.contains(rect.center().0)
    }
}

/// Detect up to two columns from the horizontal extent of the given boxes.
///
/// Looks for the widest vertical band with no box in it, searching the
/// middle 70% of the page and preferring gaps near the center. Falls back
/// to a single column when the gap is too narrow, a column is too thin, or
/// the boxes are too unevenly split.
pub fn detect_columns(rects: &[Rect]) -> Vec<Column> {
    if rects.is_empty() {
        return vec![];
    }

    let min_x = rects.iter().map(|r| r.x1).fold(f32::INFINITY, f32::min);
    let max_x = rects.iter().map(|r| r.x2).fold(f32::NEG_INFINITY, f32::max);
    let page_width = max_x - min_x;

    if page_width < MIN_PAGE_WIDTH {
        return vec![Column::single(min_x, max_x)];
    }

    let num_slices = (page_width / SLICE_WIDTH) as usize + 1;
    let mut occupancy = vec![0usize; num_slices];
    for rect in rects {
        let start = ((rect.x1 - min_x) / SLICE_WIDTH) as usize;
        let end = ((rect.x2 - min_x) / SLICE_WIDTH) as usize;
        for slot in occupancy
            .iter_mut()
            .take(end.min(num_slices - 1) + 1)
            .skip(start)
        {
            *slot += 1;
        }
    }

    // Collect empty runs inside the search window.
    let search_start = num_slices * 15 / 100;
    let search_end = num_slices * 85 / 100;
    let mut gaps: Vec<(usize, usize)> = Vec::new();
    let mut run_start = None;
    for (i, &count) in occupancy
        .iter()
        .enumerate()
        .take(search_end)
        .skip(search_start)
    {
        match (count, run_start) {
            (0, None) => run_start = Some(i),
            (0, Some(_)) => {}
            (_, Some(start)) => {
                gaps.push((start, i - start));
                run_start = None;
            }
            (_, None) => {}
        }
    }
    if let Some(start) = run_start {
        gaps.push((start, search_end.max(start) - start));
    }

    let page_center = num_slices as f32 / 2.0;
    let mut best: Option<(usize, usize, f32)> = None;
    for (start, len) in gaps {
        let width = len as f32 * SLICE_WIDTH;
        if width < 10.0 {
            continue;
        }
        let center_dist = ((start + len / 2) as f32 - page_center).abs();
        let better = match best {
            None => true,
            Some((_, best_len, best_dist)) => {
                let best_width = best_len as f32 * SLICE_WIDTH;
                width > best_width * 1.5 || (width >= best_width * 0.7 && center_dist < best_dist)
            }
        };
        if better {
            best = Some((start, len, center_dist));
        }
    }

    let Some((gap_start, gap_len, _)) = best else {
        log::debug!("No gutter found, treating as single column");
        return vec![Column::single(min_x, max_x)];
    };

    let gap_width = gap_len as f32 * SLICE_WIDTH;
    if gap_width < MIN_GUTTER_WIDTH {
        log::debug!("Gutter too small ({:.1}px), treating as single column", gap_width);
        return vec![Column::single(min_x, max_x)];
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * SLICE_WIDTH;
    if gutter - min_x < MIN_COLUMN_WIDTH || max_x - gutter < MIN_COLUMN_WIDTH {
        log::debug!("Column too narrow, treating as single column");
        return vec![Column::single(min_x, max_x)];
    }

    let left = rects.iter().filter(|r| r.center().0 < gutter).count();
    let right = rects.len() - left;
    let min_count = (rects.len() / 10).max(2);
    if left < min_count || right < min_count {
        log::debug!(
            "Boxes too imbalanced ({} left, {} right), treating as single column",
            left,
            right
        );
        return vec![Column::single(min_x, max_x)];
    }

    log::debug!("Detected gutter at x={:.1} ({:.1}px wide)", gutter, gap_width);
    vec![
        Column {
            left: min_x - 10.0,
            right: gutter,
            index: 0,
        },
        Column {
            left: gutter,
            right: max_x + 10.0,
            index: 1,
        },
    ]
}

/// Assign `column` to every region, page by page.
pub fn infer_columns(regions: &mut [Region]) {
    let mut pages: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, region) in regions.iter().enumerate() {
        pages.entry(region.page).or_default().push(i);
    }

    for (page, indices) in pages {
        let rects: Vec<Rect> = indices.iter().map(|&i| regions[i].rect).collect();
        let columns = detect_columns(&rects);
        log::debug!("Page {}: {} column(s)", page, columns.len());
        for i in indices {
            let rect = regions[i].rect;
            regions[i].column = columns
                .iter()
                .find(|c| c.contains_rect(&rect))
                .map(|c| c.index)
                .unwrap_or(0);
        }
    }
}

/// Group words into lines, top to bottom, each line left to right.
pub fn group_words_into_lines<'a>(words: &[&'a RawWord]) -> Vec<Vec<&'a RawWord>> {
    let mut sorted: Vec<&RawWord> = words.to_vec();
    sorted.sort_by(|a, b| {
        a.rect
            .y1
            .partial_cmp(&b.rect.y1)
            .unwrap_or(Ordering::Equal)
            .then(a.rect.x1.partial_cmp(&b.rect.x1).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<&RawWord>> = Vec::new();
    let mut current: Vec<&RawWord> = Vec::new();
    let mut current_y: Option<f32> = None;

    for word in sorted {
        let tolerance = word.height() * LINE_TOLERANCE;
        match current_y {
            Some(y) if (word.rect.y1 - y).abs() <= tolerance => current.push(word),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current_y = Some(word.rect.y1);
                current.push(word);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.rect.x1.partial_cmp(&b.rect.x1).unwrap_or(Ordering::Equal));
    }
    lines
}

/// Join words into text in reading order.
pub fn reading_text(words: &[&RawWord]) -> String {
    group_words_into_lines(words)
        .iter()
        .flat_map(|line| line.iter().map(|w| w.text.trim()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn rect(x: f32, y: f32, w: f32) -> Rect {
        Rect::new(x, y, x + w, y + 20.0)
    }

    #[test]
    fn test_column_contains() {
        let col = Column {
            left: 100.0,
            right: 200.0,
            index: 0,
        };
        assert!(col.contains(100.0));
        assert!(col.contains(200.0));
        assert!(!col.contains(99.0));
        assert!(col.contains_rect(&Rect::new(90.0, 0.0, 130.0, 10.0)));
        assert!(!col.contains_rect(&Rect::new(250.0, 0.0, 280.0, 10.0)));
    }

    #[test]
    fn test_detect_two_columns() {
        let mut rects = Vec::new();
        for i in 0..6 {
            let y = i as f32 * 30.0;
            rects.push(rect(0.0, y, 250.0));
            rects.push(rect(320.0, y, 250.0));
        }
        let columns = detect_columns(&rects);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].right > 250.0 && columns[0].right < 320.0);
        assert_eq!(columns[1].index, 1);
    }

    #[test]
    fn test_detect_single_column() {
        let rects: Vec<Rect> = (0..6).map(|i| rect(0.0, i as f32 * 30.0, 500.0)).collect();
        assert_eq!(detect_columns(&rects).len(), 1);
        assert!(detect_columns(&[]).is_empty());
    }

    #[test]
    fn test_narrow_page_single_column() {
        let rects = vec![rect(0.0, 0.0, 50.0), rect(150.0, 0.0, 50.0)];
        assert_eq!(detect_columns(&rects).len(), 1);
    }

    #[test]
    fn test_infer_columns_per_page() {
        let mut regions: Vec<Region> = Vec::new();
        for i in 0..4 {
            let y = i as f32 * 30.0;
            regions.push(
                Region::new(format!("L{}", i), Source::Pdf, rect(0.0, y, 250.0), "left").unwrap(),
            );
            regions.push(
                Region::new(format!("R{}", i), Source::Pdf, rect(320.0, y, 250.0), "right")
                    .unwrap(),
            );
        }
        regions.push(
            Region::new("S", Source::Pdf, rect(320.0, 0.0, 250.0), "solo")
                .unwrap()
                .with_page(2),
        );

        infer_columns(&mut regions);
        assert_eq!(regions[0].column, 0);
        assert_eq!(regions[1].column, 1);
        assert_eq!(regions[8].column, 0);
    }

    #[test]
    fn test_group_words_into_lines() {
        let words = vec![
            RawWord::new(Rect::new(60.0, 1.0, 100.0, 11.0), "world"),
            RawWord::new(Rect::new(0.0, 20.0, 50.0, 30.0), "second"),
            RawWord::new(Rect::new(0.0, 0.0, 50.0, 10.0), "hello"),
        ];
        let refs: Vec<&RawWord> = words.iter().collect();
        let lines = group_words_into_lines(&refs);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(reading_text(&refs), "hello world second");
    }
}
