use std::collections::HashMap;

use crate::heatmap::types::{CellKey, TransformedPoint};

/// Flat hash grid of square cells.
///
/// Cells are reported in the order their first member was inserted.
#[derive(Debug)]
pub struct Grid {
    cell_size: f64,
    index: HashMap<CellKey, usize>,
    cells: Vec<(CellKey, Vec<TransformedPoint>)>,
}

impl Grid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            index: HashMap::new(),
            cells: Vec::new(),
        }
    }

    /// Cell address of a point. Division results are truncated toward zero,
    /// so cell `0` spans `(-cell_size, cell_size)` on each axis.
    pub fn key_for(&self, point: TransformedPoint) -> CellKey {
        CellKey {
            x: (point.x / self.cell_size).trunc() as i64,
            y: (point.y / self.cell_size).trunc() as i64,
        }
    }

    pub fn insert(&mut self, point: TransformedPoint) -> CellKey {
        let key = self.key_for(point);
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.cells.push((key, Vec::new()));
            self.cells.len() - 1
        });
        self.cells[slot].1.push(point);
        key
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &[TransformedPoint])> {
        self.cells.iter().map(|(key, members)| (*key, members.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> TransformedPoint {
        TransformedPoint { x, y }
    }

    #[test]
    fn test_key_truncates_toward_zero() {
        let grid = Grid::new(5.0);
        assert_eq!(grid.key_for(pt(4.9, 5.0)), CellKey { x: 0, y: 1 });
        assert_eq!(grid.key_for(pt(-4.9, -5.1)), CellKey { x: 0, y: -1 });
        assert_eq!(grid.key_for(pt(-10.0, 12.4)), CellKey { x: -2, y: 2 });
    }

    #[test]
    fn test_cells_follow_first_insertion_order() {
        let mut grid = Grid::new(5.0);
        grid.insert(pt(12.0, 1.0));
        grid.insert(pt(1.0, 1.0));
        grid.insert(pt(13.0, 2.0));
        grid.insert(pt(-20.0, 1.0));

        let keys: Vec<_> = grid.cells().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["2,0", "0,0", "-4,0"]);

        let sizes: Vec<_> = grid.cells().map(|(_, m)| m.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_empty_grid() {
        let grid = Grid::new(1.0);
        assert!(grid.is_empty());
        assert_eq!(grid.cells().count(), 0);
    }
}
