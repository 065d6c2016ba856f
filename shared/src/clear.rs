//! Line clearing and scoring for the block game

use crate::generator::{points_for, ColorConfig};
use crate::grid::Grid;

/// What a single turn's clear pass found and removed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClearReport {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    /// Color of each cleared line, rows first then columns
    pub colors: Vec<String>,
    pub points: u64,
}

impl ClearReport {
    pub fn lines(&self) -> usize {
        self.colors.len()
    }
}

/// Color shared by every cell of `cells`, if they are all the same
/// non-empty color.
fn uniform_color<'a>(mut cells: impl Iterator<Item = &'a Option<String>>) -> Option<&'a str> {
    let first = cells.next()?.as_deref()?;
    cells
        .all(|cell| cell.as_deref() == Some(first))
        .then_some(first)
}

/// Points for a turn: the sum of each cleared line's color value, multiplied
/// by the number of lines cleared together.
pub fn turn_points(table: &[ColorConfig], colors: &[String]) -> u64 {
    let base: u64 = colors.iter().map(|c| points_for(table, c)).sum();
    base * colors.len() as u64
}

/// Detects every uniform row and column of `grid` in one pass, then empties
/// all of them at once.
///
/// Lines are judged on the board as it was before any removal, so a row and a
/// column crossing each other both count even though they share a cell.
pub fn clear_lines(grid: &Grid, table: &[ColorConfig]) -> (Grid, ClearReport) {
    let mut report = ClearReport::default();

    for r in 0..grid.rows() {
        if let Some(color) = uniform_color(grid.row(r).iter()) {
            report.rows.push(r);
            report.colors.push(color.to_string());
        }
    }

    for c in 0..grid.cols() {
        let column = (0..grid.rows()).filter_map(|r| grid.get(r, c));
        if let Some(color) = uniform_color(column) {
            report.cols.push(c);
            report.colors.push(color.to_string());
        }
    }

    if report.colors.is_empty() {
        return (grid.clone(), report);
    }

    let mut next = grid.clone();
    for &r in &report.rows {
        for c in 0..grid.cols() {
            next.set(r, c, None);
        }
    }
    for &c in &report.cols {
        for r in 0..grid.rows() {
            next.set(r, c, None);
        }
    }

    report.points = turn_points(table, &report.colors);
    (next, report)
}
