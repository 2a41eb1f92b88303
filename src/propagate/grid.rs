//! Uniform grid over word positions for neighbourhood queries.

use std::collections::HashMap;

use crate::model::RawWord;

/// Buckets words by the cell containing their top-left corner.
#[derive(Debug)]
pub struct WordGrid {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl WordGrid {
    /// Index `words` with square cells of side `cell`.
    pub fn build(words: &[RawWord], cell: f32) -> Self {
        let cell = if cell.is_finite() && cell > 0.0 { cell } else { 1.0 };
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, word) in words.iter().enumerate() {
            let key = Self::key(cell, word.rect.x1, word.rect.y1);
            cells.entry(key).or_default().push(i);
        }
        Self { cell, cells }
    }

    fn key(cell: f32, x: f32, y: f32) -> (i32, i32) {
        ((x / cell).floor() as i32, (y / cell).floor() as i32)
    }

    /// Indices of words whose top-left corner lies within `radius` of `(x, y)`
    /// on both axes, in ascending index order.
    pub fn near(&self, words: &[RawWord], x: f32, y: f32, radius: f32) -> Vec<usize> {
        let (cx0, cy0) = Self::key(self.cell, x - radius, y - radius);
        let (cx1, cy1) = Self::key(self.cell, x + radius, y + radius);

        let mut found = Vec::new();
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    found.extend(bucket.iter().copied().filter(|&i| {
                        let rect = &words[i].rect;
                        (rect.x1 - x).abs() <= radius && (rect.y1 - y).abs() <= radius
                    }));
                }
            }
        }
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    #[test]
    fn test_grid_near() {
        let words = vec![
            RawWord::new(Rect::new(10.0, 10.0, 30.0, 20.0), "a"),
            RawWord::new(Rect::new(14.0, 12.0, 30.0, 20.0), "b"),
            RawWord::new(Rect::new(200.0, 200.0, 230.0, 210.0), "c"),
        ];
        let grid = WordGrid::build(&words, 16.0);
        assert_eq!(grid.near(&words, 12.0, 11.0, 4.0), vec![0, 1]);
        assert_eq!(grid.near(&words, 200.0, 200.0, 1.0), vec![2]);
        assert!(grid.near(&words, 100.0, 100.0, 5.0).is_empty());
    }
}
