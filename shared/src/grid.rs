//! Dense board representation shared by both games

use serde::{Deserialize, Serialize};

/// A single board cell: `None` when empty, otherwise the color token of the
/// brick covering it.
pub type Cell = Option<String>;

/// Row-major `rows × cols` board.
///
/// Serializes as a plain 2-D array so snapshots keep the same shape on the
/// wire as in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates an empty board of the given size
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![None; cols]; rows],
        }
    }

    /// Wraps pre-built rows. Returns `None` if the rows are ragged.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Option<Self> {
        let cols = cells.first().map_or(0, Vec::len);
        if cells.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Returns the cell at `(row, col)`, or `None` if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Signed lookup used by placement checks. Off-board anchors yield `None`.
    pub fn get_signed(&self, row: i32, col: i32) -> Option<&Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        matches!(self.get(row, col), Some(None))
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Positions of every empty cell in row-major order
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut empty = Vec::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_none() {
                    empty.push((r, c));
                }
            }
        }
        empty
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(3, 4);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.filled_count(), 0);
        assert_eq!(grid.empty_cells().len(), 12);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let ragged = vec![vec![None, None], vec![None]];
        assert!(Grid::from_rows(ragged).is_none());

        let ok = vec![vec![None, Some("#A".to_string())], vec![None, None]];
        let grid = Grid::from_rows(ok).unwrap();
        assert_eq!(grid.filled_count(), 1);
        assert!(!grid.is_empty_at(0, 1));
    }

    #[test]
    fn test_signed_lookup_out_of_bounds() {
        let grid = Grid::new(2, 2);
        assert!(grid.get_signed(-1, 0).is_none());
        assert!(grid.get_signed(0, 2).is_none());
        assert_eq!(grid.get_signed(1, 1), Some(&None));
    }

    #[test]
    fn test_serializes_as_plain_matrix() {
        let mut grid = Grid::new(1, 2);
        grid.set(0, 1, Some("#D92328".to_string()));
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r##"[[null,"#D92328"]]"##);

        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }
}
