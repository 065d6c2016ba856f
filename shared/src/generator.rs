//! Weighted random piece generation for the block game

use crate::shape::{Shape, SHAPE_CATALOGUE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Points awarded for a cleared line whose color is not in the table
pub const DEFAULT_LINE_POINTS: u64 = 100;

/// Pieces generated when a block game starts
pub const INITIAL_QUEUE_LEN: usize = 100;

/// Pieces appended whenever the queue runs low
pub const REFILL_BATCH_LEN: usize = 50;

/// Number of simultaneously available piece slots
pub const SLOT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorConfig {
    pub color: &'static str,
    pub weight: f64,
    pub points: u64,
    pub name: &'static str,
}

/// Colors in draw order with their relative weight and per-line value
pub const COLOR_TABLE: [ColorConfig; 4] = [
    ColorConfig {
        color: "#D92328",
        weight: 50.0,
        points: 100,
        name: "red (common)",
    },
    ColorConfig {
        color: "#006CB7",
        weight: 30.0,
        points: 250,
        name: "blue (uncommon)",
    },
    ColorConfig {
        color: "#FFCF00",
        weight: 15.0,
        points: 500,
        name: "yellow (rare)",
    },
    ColorConfig {
        color: "#237841",
        weight: 5.0,
        points: 1000,
        name: "green (legendary)",
    },
];

/// Line value of `color` in `table`
pub fn points_for(table: &[ColorConfig], color: &str) -> u64 {
    table
        .iter()
        .find(|entry| entry.color == color)
        .map_or(DEFAULT_LINE_POINTS, |entry| entry.points)
}

/// Cumulative-weight draw: `u` uniform in `[0, total)`, then walk the table
/// subtracting each weight until `u` falls inside an entry.
pub fn weighted_color<R: Rng + ?Sized>(rng: &mut R, table: &[ColorConfig]) -> &'static str {
    let total: f64 = table.iter().map(|entry| entry.weight).sum();
    let fallback = table.first().map_or(COLOR_TABLE[0].color, |e| e.color);
    if total <= 0.0 {
        return fallback;
    }

    let mut u = rng.gen_range(0.0..total);
    for entry in table {
        if u < entry.weight {
            return entry.color;
        }
        u -= entry.weight;
    }
    // Floating point drift can leave a sliver past the last entry
    table.last().map_or(fallback, |e| e.color)
}

/// A rotatable polyomino with its color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub shape: Shape,
    pub color: String,
}

impl Piece {
    pub fn new(shape: Shape, color: impl Into<String>) -> Self {
        Self {
            shape,
            color: color.into(),
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_clockwise(),
            color: self.color.clone(),
        }
    }
}

/// Uniform shape, weighted color
pub fn random_piece<R: Rng + ?Sized>(rng: &mut R, table: &[ColorConfig]) -> Piece {
    let shape = Shape::from_catalogue(rng.gen_range(0..SHAPE_CATALOGUE.len()));
    Piece::new(shape, weighted_color(rng, table))
}

pub fn random_batch<R: Rng + ?Sized>(rng: &mut R, table: &[ColorConfig], len: usize) -> Vec<Piece> {
    (0..len).map(|_| random_piece(rng, table)).collect()
}

/// Refills empty slots from the queue once all of them are consumed.
///
/// Returns `true` if the slots were refilled. A fresh batch is generated first
/// when the queue holds fewer pieces than there are slots.
pub fn replenish<R: Rng + ?Sized>(
    rng: &mut R,
    table: &[ColorConfig],
    slots: &mut [Option<Piece>; SLOT_COUNT],
    queue: &mut VecDeque<Piece>,
) -> bool {
    if slots.iter().any(Option::is_some) {
        return false;
    }
    if queue.len() < SLOT_COUNT {
        queue.extend(random_batch(rng, table, REFILL_BATCH_LEN));
    }
    for slot in slots.iter_mut() {
        *slot = queue.pop_front();
    }
    true
}
