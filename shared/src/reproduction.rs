//! Tile-reproduction game: rebuild a target mosaic from a finite brick queue

use crate::engine::{GameEngine, GameId, Move, StallPolicy};
use crate::generator::Piece;
use crate::grid::Grid;
use crate::placement::{is_valid_placement, place, valid_positions};
use crate::protocol::MAX_BOARD_DIM;
use crate::shape::Rect;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Queue entry as sent by the mosaic provider: either a bare color (a 1×1
/// brick) or a full rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueueBrick {
    Color(String),
    Brick(Rect),
}

impl QueueBrick {
    pub fn into_rect(self) -> Rect {
        match self {
            QueueBrick::Color(color) => Rect::new(0, 0, 1, 1, color),
            QueueBrick::Brick(rect) => rect,
        }
    }
}

/// Level payload of a reproduction game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicLevel {
    pub rows: usize,
    pub cols: usize,
    pub target_bricks: Vec<Rect>,
    pub bricks_queue: Vec<QueueBrick>,
}

/// Reasons a mosaic from the provider cannot be played
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MosaicError {
    #[error("mosaic board {0}x{1} must be between 1x1 and 64x64")]
    BoardSize(usize, usize),
    #[error("target brick {0} has zero width or height")]
    EmptyTargetBrick(usize),
    #[error("target brick {0} lies outside the board")]
    TargetOutOfBounds(usize),
    #[error("queued brick {0} has zero width or height")]
    EmptyQueueBrick(usize),
    #[error("queued brick {0} is larger than the board")]
    QueueBrickTooLarge(usize),
}

impl MosaicLevel {
    /// Checks the board size and that every brick is non-empty and fits
    pub fn validate(&self) -> Result<(), MosaicError> {
        let (rows, cols) = (self.rows, self.cols);
        if rows == 0 || cols == 0 || rows > MAX_BOARD_DIM || cols > MAX_BOARD_DIM {
            return Err(MosaicError::BoardSize(rows, cols));
        }

        for (i, brick) in self.target_bricks.iter().enumerate() {
            if brick.w == 0 || brick.h == 0 {
                return Err(MosaicError::EmptyTargetBrick(i));
            }
            let bottom = brick.y.checked_add(brick.h);
            let right = brick.x.checked_add(brick.w);
            if !matches!((bottom, right), (Some(b), Some(r)) if b <= rows && r <= cols) {
                return Err(MosaicError::TargetOutOfBounds(i));
            }
        }

        for (i, entry) in self.bricks_queue.iter().enumerate() {
            if let QueueBrick::Brick(brick) = entry {
                if brick.w == 0 || brick.h == 0 {
                    return Err(MosaicError::EmptyQueueBrick(i));
                }
                if brick.h > rows || brick.w > cols {
                    return Err(MosaicError::QueueBrickTooLarge(i));
                }
            }
        }
        Ok(())
    }
}

/// Paints `bricks` in order onto an empty `rows × cols` board. Cells outside
/// the board are dropped and later bricks win on overlap.
pub fn rasterize(rows: usize, cols: usize, bricks: &[Rect]) -> Grid {
    let mut grid = Grid::new(rows, cols);
    for brick in bricks {
        for dr in 0..brick.h {
            let Some(row) = brick.y.checked_add(dr).filter(|row| *row < rows) else {
                break;
            };
            for dc in 0..brick.w {
                let Some(col) = brick.x.checked_add(dc).filter(|col| *col < cols) else {
                    break;
                };
                grid.set(row, col, Some(brick.color.clone()));
            }
        }
    }
    grid
}

/// Number of non-empty cells where `result` matches `target`
pub fn reproduction_score(result: &Grid, target: &Grid) -> u64 {
    result
        .iter_rows()
        .zip(target.iter_rows())
        .flat_map(|(a, b)| a.iter().zip(b.iter()))
        .filter(|(a, b)| a.is_some() && a == b)
        .count() as u64
}

pub struct ReproductionEngine {
    target: Grid,
    board: Grid,
    queue: VecDeque<Rect>,
    placed: Vec<Rect>,
    final_score: Option<u64>,
}

impl ReproductionEngine {
    pub fn new(level: MosaicLevel) -> Self {
        let target = rasterize(level.rows, level.cols, &level.target_bricks);
        let queue: VecDeque<Rect> = level
            .bricks_queue
            .into_iter()
            .map(QueueBrick::into_rect)
            .collect();

        let mut engine = Self {
            target,
            board: Grid::new(level.rows, level.cols),
            queue,
            placed: Vec::new(),
            final_score: None,
        };
        if engine.queue.is_empty() {
            engine.finish();
        }
        engine
    }

    pub fn target(&self) -> &Grid {
        &self.target
    }

    /// The brick to place this turn
    pub fn current(&self) -> Option<&Rect> {
        self.queue.front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Bricks placed so far, in placement order
    pub fn placed(&self) -> &[Rect] {
        &self.placed
    }

    fn finish(&mut self) {
        if self.final_score.is_some() {
            return;
        }
        let result = rasterize(self.board.rows(), self.board.cols(), &self.placed);
        let score = reproduction_score(&result, &self.target);
        debug!("Reproduction finished with {} matching cells", score);
        self.final_score = Some(score);
    }
}

impl GameEngine for ReproductionEngine {
    fn game_id(&self) -> GameId {
        GameId::Reproduction
    }

    fn board(&self) -> &Grid {
        &self.board
    }

    fn score(&self) -> u64 {
        self.final_score.unwrap_or(0)
    }

    fn play(&mut self, mv: Move) -> bool {
        if self.is_finished() || mv.slot != 0 {
            return false;
        }
        let Some(brick) = self.queue.front() else {
            return false;
        };
        let shape = brick.shape();
        if !is_valid_placement(&self.board, mv.row, mv.col, &shape) {
            return false;
        }

        self.board = place(&self.board, mv.row, mv.col, &shape, &brick.color);
        let placed = brick.at(mv.row as usize, mv.col as usize);
        self.placed.push(placed);
        self.queue.pop_front();

        if self.queue.is_empty() {
            self.finish();
        }
        true
    }

    fn auto_moves(&self) -> Vec<Move> {
        match self.current() {
            Some(brick) => valid_positions(&self.board, &brick.shape())
                .into_iter()
                .map(|(r, c)| Move::new(0, r, c))
                .collect(),
            None => Vec::new(),
        }
    }

    fn stall_policy(&self) -> StallPolicy {
        StallPolicy::Ignore
    }

    fn force_finish(&mut self) {
        self.finish();
    }

    fn is_finished(&self) -> bool {
        self.final_score.is_some()
    }

    fn final_score(&self) -> u64 {
        self.final_score.unwrap_or(0)
    }

    fn pieces(&self) -> Vec<Option<Piece>> {
        vec![self
            .current()
            .map(|brick| Piece::new(brick.shape(), brick.color.clone()))]
    }

    fn target(&self) -> Option<&Grid> {
        Some(&self.target)
    }
}
