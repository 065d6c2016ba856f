//! Grid-clearing block game: place polyominoes, clear uniform lines

use crate::clear::{clear_lines, ClearReport};
use crate::engine::{GameEngine, GameId, Move, StallPolicy};
use crate::generator::{random_batch, replenish, ColorConfig, Piece, COLOR_TABLE, INITIAL_QUEUE_LEN, SLOT_COUNT};
use crate::grid::Grid;
use crate::placement::{can_place_anywhere, is_valid_placement, place, valid_positions};
use crate::protocol::Snapshot;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

pub struct BlockClearEngine {
    board: Grid,
    slots: [Option<Piece>; SLOT_COUNT],
    queue: VecDeque<Piece>,
    score: u64,
    game_over: bool,
    table: &'static [ColorConfig],
    rng: StdRng,
    last_clear: ClearReport,
}

impl BlockClearEngine {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_rng(rows, cols, StdRng::from_entropy())
    }

    /// Deterministic engine for replays and tests
    pub fn with_seed(rows: usize, cols: usize, seed: u64) -> Self {
        Self::with_rng(rows, cols, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rows: usize, cols: usize, mut rng: StdRng) -> Self {
        let queue: VecDeque<Piece> = random_batch(&mut rng, &COLOR_TABLE, INITIAL_QUEUE_LEN).into();
        let mut engine = Self {
            board: Grid::new(rows, cols),
            slots: [None, None, None],
            queue,
            score: 0,
            game_over: false,
            table: &COLOR_TABLE,
            rng,
            last_clear: ClearReport::default(),
        };
        engine.refill_and_check();
        engine
    }

    /// Builds an engine from a fixed board, slot contents and queue
    pub fn from_parts(board: Grid, slots: [Option<Piece>; SLOT_COUNT], queue: Vec<Piece>) -> Self {
        let mut engine = Self {
            board,
            slots,
            queue: queue.into(),
            score: 0,
            game_over: false,
            table: &COLOR_TABLE,
            rng: StdRng::seed_from_u64(0),
            last_clear: ClearReport::default(),
        };
        engine.check_game_over();
        engine
    }

    /// Uses a custom color table for line values
    pub fn with_table(mut self, table: &'static [ColorConfig]) -> Self {
        self.table = table;
        self
    }

    pub fn slots(&self) -> &[Option<Piece>; SLOT_COUNT] {
        &self.slots
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Lines removed by the most recent placement
    pub fn last_clear(&self) -> &ClearReport {
        &self.last_clear
    }

    /// True if no remaining piece fits anywhere in any rotation
    pub fn no_piece_fits(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .all(|piece| !can_place_anywhere(&self.board, &piece.shape))
    }

    fn check_game_over(&mut self) {
        if self.no_piece_fits() {
            debug!("No piece fits, block game over at {} points", self.score);
            self.game_over = true;
        }
    }

    fn refill_and_check(&mut self) {
        replenish(&mut self.rng, self.table, &mut self.slots, &mut self.queue);
        self.check_game_over();
    }
}

impl GameEngine for BlockClearEngine {
    fn game_id(&self) -> GameId {
        GameId::BlockClear
    }

    fn board(&self) -> &Grid {
        &self.board
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn play(&mut self, mv: Move) -> bool {
        if self.game_over {
            return false;
        }
        let Some(Some(piece)) = self.slots.get(mv.slot) else {
            return false;
        };
        if !is_valid_placement(&self.board, mv.row, mv.col, &piece.shape) {
            return false;
        }

        let placed = place(&self.board, mv.row, mv.col, &piece.shape, &piece.color);
        let (cleared, report) = clear_lines(&placed, self.table);
        if report.lines() > 0 {
            debug!(
                "Cleared {} line(s) for {} points",
                report.lines(),
                report.points
            );
        }
        self.board = cleared;
        self.score += report.points;
        self.last_clear = report;
        self.slots[mv.slot] = None;

        self.refill_and_check();
        true
    }

    fn rotate(&mut self, slot: usize) -> bool {
        if self.game_over {
            return false;
        }
        match self.slots.get_mut(slot) {
            Some(Some(piece)) => {
                *piece = piece.rotated();
                true
            }
            _ => false,
        }
    }

    /// Positions for the first non-empty slot, in its current orientation
    fn auto_moves(&self) -> Vec<Move> {
        let Some((slot, piece)) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(i, p)| p.as_ref().map(|p| (i, p)))
        else {
            return Vec::new();
        };
        valid_positions(&self.board, &piece.shape)
            .into_iter()
            .map(|(r, c)| Move::new(slot, r, c))
            .collect()
    }

    fn stall_policy(&self) -> StallPolicy {
        StallPolicy::Finish
    }

    fn force_finish(&mut self) {
        self.game_over = true;
    }

    fn is_finished(&self) -> bool {
        self.game_over
    }

    fn final_score(&self) -> u64 {
        self.score
    }

    fn pieces(&self) -> Vec<Option<Piece>> {
        self.slots.to_vec()
    }

    fn snapshot(&self) -> Option<Snapshot> {
        Some(Snapshot {
            board: self.board.clone(),
            available_pieces: self.slots.to_vec(),
            score: self.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    const TWO_COLORS: [ColorConfig; 2] = [
        ColorConfig {
            color: "#A",
            weight: 1.0,
            points: 100,
            name: "a",
        },
        ColorConfig {
            color: "#B",
            weight: 1.0,
            points: 250,
            name: "b",
        },
    ];

    fn filled(color: &str) -> Option<String> {
        Some(color.to_string())
    }

    fn domino(color: &str) -> Piece {
        Piece::new(Shape::new(vec![vec![1, 1]]).unwrap(), color)
    }

    #[test]
    fn test_new_engine_fills_slots() {
        let engine = BlockClearEngine::with_seed(8, 8, 1);
        assert!(engine.slots().iter().all(Option::is_some));
        assert_eq!(engine.queue_len(), INITIAL_QUEUE_LEN - SLOT_COUNT);
        assert!(!engine.is_finished());
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_game_over_on_nearly_full_board() {
        let board = Grid::from_rows(vec![
            vec![filled("#A"), filled("#B")],
            vec![filled("#B"), None],
        ])
        .unwrap();
        let engine =
            BlockClearEngine::from_parts(board, [Some(domino("#A")), None, None], Vec::new());
        assert!(engine.no_piece_fits());
        assert!(engine.is_finished());
    }

    #[test]
    fn test_single_row_clear_scores_once() {
        let board = Grid::from_rows(vec![
            vec![filled("#A"), None, None],
            vec![None, filled("#B"), None],
            vec![None, None, None],
        ])
        .unwrap();
        let mut engine = BlockClearEngine::from_parts(
            board,
            [Some(domino("#A")), Some(domino("#B")), None],
            Vec::new(),
        )
        .with_table(&TWO_COLORS);

        assert!(engine.play(Move::new(0, 0, 1)));
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.last_clear().rows, vec![0]);
        assert_eq!(engine.board().row(0), &[None, None, None]);
        assert!(engine.slots()[0].is_none());
    }

    #[test]
    fn test_two_color_simultaneous_clear() {
        // Row 1 is already uniform #B; completing row 0 with #A clears both
        let board = Grid::from_rows(vec![
            vec![filled("#A"), filled("#A"), None],
            vec![filled("#B"), filled("#B"), filled("#B")],
            vec![None, None, None],
        ])
        .unwrap();
        let single = Piece::new(Shape::new(vec![vec![1]]).unwrap(), "#A");
        let mut engine = BlockClearEngine::from_parts(board, [Some(single), None, None], Vec::new())
            .with_table(&TWO_COLORS);

        assert!(engine.play(Move::new(0, 0, 2)));
        assert_eq!(engine.last_clear().rows, vec![0, 1]);
        assert_eq!(engine.score(), (100 + 250) * 2);
        assert_eq!(engine.board().filled_count(), 0);
    }

    #[test]
    fn test_row_and_column_cleared_in_same_turn() {
        let board = Grid::from_rows(vec![
            vec![filled("#A"), filled("#A"), None],
            vec![filled("#B"), filled("#B"), None],
            vec![None, None, filled("#A")],
        ])
        .unwrap();
        let stack = Piece::new(Shape::new(vec![vec![1], vec![1]]).unwrap(), "#A");
        let mut engine = BlockClearEngine::from_parts(board, [Some(stack), None, None], Vec::new())
            .with_table(&TWO_COLORS);

        assert!(engine.play(Move::new(0, 0, 2)));
        assert_eq!(engine.last_clear().rows, vec![0]);
        assert_eq!(engine.last_clear().cols, vec![2]);
        assert_eq!(engine.score(), (100 + 100) * 2);
        assert_eq!(
            engine.board().row(1),
            &[filled("#B"), filled("#B"), None]
        );
    }

    #[test]
    fn test_invalid_move_is_noop() {
        let mut engine = BlockClearEngine::with_seed(8, 8, 3);
        let before = engine.board().clone();
        let slots_before = engine.slots().clone();

        assert!(!engine.play(Move::new(0, -1, -1)));
        assert!(!engine.play(Move::new(5, 0, 0)));
        assert_eq!(engine.board(), &before);
        assert_eq!(engine.slots(), &slots_before);
    }

    #[test]
    fn test_rotate_slot() {
        let mut engine = BlockClearEngine::from_parts(
            Grid::new(4, 4),
            [Some(domino("#A")), None, None],
            Vec::new(),
        );
        assert!(engine.rotate(0));
        assert_eq!(engine.slots()[0].as_ref().unwrap().shape.height(), 2);
        assert!(!engine.rotate(1));
    }

    #[test]
    fn test_slots_refill_after_all_used() {
        let mut engine = BlockClearEngine::with_seed(8, 8, 11);
        let mut plays = 0;
        while engine.slots().iter().any(Option::is_some) && plays < SLOT_COUNT {
            let mv = engine.auto_moves()[0];
            assert!(engine.play(mv));
            plays += 1;
        }
        assert!(engine.slots().iter().all(Option::is_some));
        assert_eq!(engine.queue_len(), INITIAL_QUEUE_LEN - 2 * SLOT_COUNT);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let engine = BlockClearEngine::with_seed(8, 8, 2);
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.board, *engine.board());
        assert_eq!(snapshot.available_pieces.len(), SLOT_COUNT);
        assert_eq!(snapshot.score, 0);
        assert!(snapshot.validate().is_ok());
    }
}
