//! Placeable footprints: polyomino matrices and axis-aligned bricks

use serde::{Deserialize, Serialize};

/// Rectangular 0/1 occupancy matrix of a piece.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape {
    cells: Vec<Vec<u8>>,
}

/// The fixed polyomino catalogue of the block game
pub const SHAPE_CATALOGUE: [&[&[u8]]; 7] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[0, 1, 0], &[1, 1, 1]],
    &[&[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[1, 1, 1]],
    &[&[0, 1, 1], &[1, 1, 0]],
    &[&[1, 1, 0], &[0, 1, 1]],
];

impl Shape {
    /// Builds a shape from raw rows. Returns `None` for empty, ragged or
    /// non-binary matrices.
    pub fn new(cells: Vec<Vec<u8>>) -> Option<Self> {
        let shape = Self { cells };
        shape.is_well_formed().then_some(shape)
    }

    /// Solid `h × w` footprint of a rectangular brick
    pub fn solid(h: usize, w: usize) -> Self {
        Self {
            cells: vec![vec![1; w]; h],
        }
    }

    pub fn from_catalogue(index: usize) -> Self {
        let rows = SHAPE_CATALOGUE[index % SHAPE_CATALOGUE.len()];
        Self {
            cells: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.cells
    }

    /// Offsets `(dr, dc)` of every occupied cell, row-major
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v == 1)
                .map(move |(c, _)| (r, c))
        })
    }

    /// Rotates 90° clockwise: an `R×C` matrix becomes `C×R` with
    /// `new[i][j] = old[R-1-j][i]`.
    pub fn rotated_clockwise(&self) -> Self {
        let r = self.height();
        let c = self.width();
        let cells = (0..c)
            .map(|i| (0..r).map(|j| self.cells[r - 1 - j][i]).collect())
            .collect();
        Self { cells }
    }

    /// The shape in each of its four orientations, starting with itself
    pub fn orientations(&self) -> [Shape; 4] {
        let quarter = self.rotated_clockwise();
        let half = quarter.rotated_clockwise();
        let three_quarters = half.rotated_clockwise();
        [self.clone(), quarter, half, three_quarters]
    }

    /// Non-empty, rectangular, binary and with at least one filled cell
    pub fn is_well_formed(&self) -> bool {
        let width = self.width();
        width > 0
            && self
                .cells
                .iter()
                .all(|row| row.len() == width && row.iter().all(|v| *v <= 1))
            && self.occupied().next().is_some()
    }
}

/// An axis-aligned rectangular brick of the reproduction game.
///
/// `x` is the column and `y` the row of the top-left cell. Queue entries only
/// use the size and color; the position is filled in once placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub x: usize,
    #[serde(default)]
    pub y: usize,
    pub w: usize,
    pub h: usize,
    pub color: String,
}

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize, color: impl Into<String>) -> Self {
        Self {
            x,
            y,
            w,
            h,
            color: color.into(),
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::solid(self.h.max(1), self.w.max(1))
    }

    /// Same brick anchored at `(row, col)`
    pub fn at(&self, row: usize, col: usize) -> Self {
        Self {
            x: col,
            y: row,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_swaps_dimensions() {
        let t = Shape::from_catalogue(2);
        assert_eq!((t.height(), t.width()), (2, 3));

        let rotated = t.rotated_clockwise();
        assert_eq!((rotated.height(), rotated.width()), (3, 2));
        assert_eq!(
            rotated.rows(),
            &[vec![1, 0], vec![1, 1], vec![1, 0]]
        );
    }

    #[test]
    fn test_four_rotations_are_identity() {
        for index in 0..SHAPE_CATALOGUE.len() {
            let shape = Shape::from_catalogue(index);
            let back = shape
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise();
            assert_eq!(back, shape, "catalogue entry {}", index);
        }
    }

    #[test]
    fn test_rotation_formula() {
        let shape = Shape::new(vec![vec![1, 0, 0], vec![1, 1, 1]]).unwrap();
        let rotated = shape.rotated_clockwise();
        let r = shape.height();
        for i in 0..rotated.height() {
            for j in 0..rotated.width() {
                assert_eq!(rotated.rows()[i][j], shape.rows()[r - 1 - j][i]);
            }
        }
    }

    #[test]
    fn test_well_formed_checks() {
        assert!(Shape::new(vec![]).is_none());
        assert!(Shape::new(vec![vec![1, 1], vec![1]]).is_none());
        assert!(Shape::new(vec![vec![0, 0]]).is_none());
        assert!(Shape::new(vec![vec![2]]).is_none());
        assert!(Shape::new(vec![vec![0, 1]]).is_some());
    }

    #[test]
    fn test_occupied_offsets() {
        let s = Shape::from_catalogue(5);
        let cells: Vec<_> = s.occupied().collect();
        assert_eq!(cells, vec![(0, 1), (0, 2), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_rect_shape_and_anchor() {
        let brick = Rect::new(0, 0, 3, 2, "#006CB7");
        let shape = brick.shape();
        assert_eq!((shape.height(), shape.width()), (2, 3));
        assert_eq!(shape.occupied().count(), 6);

        let placed = brick.at(4, 1);
        assert_eq!((placed.y, placed.x), (4, 1));
        assert_eq!(placed.color, "#006CB7");
    }
}
