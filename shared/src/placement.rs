//! Placement validation and application
//!
//! Both games route every move through these functions: interactive moves,
//! the timeout auto-placer and the game-over scan all agree on what a legal
//! placement is because they share `is_valid_placement`.

use crate::grid::Grid;
use crate::shape::Shape;

/// Checks that every occupied cell of `shape`, anchored with its top-left
/// corner at `(row, col)`, lands on an in-bounds empty cell.
pub fn is_valid_placement(grid: &Grid, row: i32, col: i32, shape: &Shape) -> bool {
    shape.occupied().all(|(dr, dc)| {
        matches!(
            grid.get_signed(row + dr as i32, col + dc as i32),
            Some(None)
        )
    })
}

/// Writes `color` into every occupied cell and returns the new board.
///
/// The input grid is left untouched. Bounds and overlap are preconditions
/// checked by [`is_valid_placement`], not here.
pub fn place(grid: &Grid, row: i32, col: i32, shape: &Shape, color: &str) -> Grid {
    debug_assert!(is_valid_placement(grid, row, col, shape));
    let mut next = grid.clone();
    for (dr, dc) in shape.occupied() {
        let r = row + dr as i32;
        let c = col + dc as i32;
        if r >= 0 && c >= 0 {
            next.set(r as usize, c as usize, Some(color.to_string()));
        }
    }
    next
}

/// Every anchor at which `shape` fits, row-major
pub fn valid_positions(grid: &Grid, shape: &Shape) -> Vec<(i32, i32)> {
    let mut positions = Vec::new();
    for r in 0..grid.rows() as i32 {
        for c in 0..grid.cols() as i32 {
            if is_valid_placement(grid, r, c, shape) {
                positions.push((r, c));
            }
        }
    }
    positions
}

/// True if `shape` fits somewhere in any of its four rotations
pub fn can_place_anywhere(grid: &Grid, shape: &Shape) -> bool {
    shape.orientations().iter().any(|orientation| {
        (0..grid.rows() as i32).any(|r| {
            (0..grid.cols() as i32).any(|c| is_valid_placement(grid, r, c, orientation))
        })
    })
}
