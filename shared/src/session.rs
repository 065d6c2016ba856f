//! Per-player turn machine driving either game engine
//!
//! A session moves through `Loading → Active → Finished`. While active, each
//! turn is keyed by a monotonically increasing counter. The caller arms a
//! countdown for [`GameSession::turn`] and reports expiry through
//! [`GameSession::handle_timeout`]; a report carrying an old turn is stale and
//! does nothing, so a countdown that fires after a manual move can never place
//! a second piece.

use crate::block_clear::BlockClearEngine;
use crate::engine::{GameEngine, GameId, Move, StallPolicy};
use crate::protocol::{LevelData, Snapshot};
use crate::reproduction::{MosaicError, ReproductionEngine};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;
use thiserror::Error;

/// Countdown per turn in the reproduction game
pub const REPRODUCTION_TURN: Duration = Duration::from_secs(5);

/// Countdown per turn in the block game
pub const BLOCK_CLEAR_TURN: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Active,
    Finished,
}

/// Result of reporting an expired countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// The countdown belonged to an earlier turn, or the session is not active
    Stale,
    /// The auto-placer applied this move
    Placed(Move),
    /// No legal destination; the turn stays as it is
    Ignored,
    /// No legal destination and the game ended
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("level data does not match game '{0}'")]
    LevelMismatch(GameId),
    #[error("unplayable mosaic: {0}")]
    InvalidMosaic(#[from] MosaicError),
}

pub struct GameSession {
    engine: Box<dyn GameEngine>,
    phase: SessionPhase,
    turn: u64,
    turn_duration: Duration,
    final_score: Option<u64>,
    rng: StdRng,
}

impl GameSession {
    pub fn new(engine: Box<dyn GameEngine>) -> Self {
        let turn_duration = match engine.game_id() {
            GameId::Reproduction => REPRODUCTION_TURN,
            GameId::BlockClear => BLOCK_CLEAR_TURN,
        };
        Self {
            engine,
            phase: SessionPhase::Loading,
            turn: 0,
            turn_duration,
            final_score: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Builds the engine matching `game_id` from a `game_started` payload
    pub fn from_level(game_id: GameId, level: LevelData) -> Result<Self, SessionError> {
        let engine: Box<dyn GameEngine> = match (game_id, level) {
            (GameId::Reproduction, LevelData::Mosaic(mosaic)) => {
                mosaic.validate()?;
                Box::new(ReproductionEngine::new(mosaic))
            }
            (GameId::BlockClear, LevelData::Grid { rows, cols }) => {
                Box::new(BlockClearEngine::new(rows, cols))
            }
            (GameId::BlockClear, LevelData::Mosaic(mosaic)) => {
                mosaic.validate()?;
                Box::new(BlockClearEngine::new(mosaic.rows, mosaic.cols))
            }
            (GameId::Reproduction, LevelData::Grid { .. }) => {
                return Err(SessionError::LevelMismatch(game_id));
            }
        };
        Ok(Self::new(engine))
    }

    pub fn with_turn_duration(mut self, turn_duration: Duration) -> Self {
        self.turn_duration = turn_duration;
        self
    }

    /// Seeds the auto-placer's position choice
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Enters the active phase. Returns `false` if the session already left
    /// `Loading`.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Loading {
            return false;
        }
        self.phase = SessionPhase::Active;
        info!(
            "{} session active, {:?} per turn",
            self.engine.game_id(),
            self.turn_duration
        );
        self.check_finished();
        true
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Key of the current turn; countdowns are armed against it
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn turn_duration(&self) -> Duration {
        self.turn_duration
    }

    pub fn game_id(&self) -> GameId {
        self.engine.game_id()
    }

    pub fn engine(&self) -> &dyn GameEngine {
        self.engine.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.final_score.unwrap_or_else(|| self.engine.score())
    }

    /// Set once the session is finished
    pub fn final_score(&self) -> Option<u64> {
        self.final_score
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.engine.snapshot()
    }

    /// Applies a manual move. Illegal moves and moves outside the active
    /// phase return `false` and leave the turn unchanged.
    pub fn play(&mut self, mv: Move) -> bool {
        if !self.is_active() || !self.engine.play(mv) {
            return false;
        }
        self.advance();
        true
    }

    /// Rotates a not-yet-placed piece; does not consume the turn
    pub fn rotate(&mut self, slot: usize) -> bool {
        self.is_active() && self.engine.rotate(slot)
    }

    /// Reports that the countdown armed for `turn` expired.
    pub fn handle_timeout(&mut self, turn: u64) -> TimeoutOutcome {
        if !self.is_active() || turn != self.turn {
            debug!("Ignoring stale timeout for turn {} (now {})", turn, self.turn);
            return TimeoutOutcome::Stale;
        }

        let moves = self.engine.auto_moves();
        match moves.choose(&mut self.rng).copied() {
            Some(mv) => {
                if self.engine.play(mv) {
                    debug!("Auto-placed {:?} on turn {}", mv, turn);
                    self.advance();
                    TimeoutOutcome::Placed(mv)
                } else {
                    TimeoutOutcome::Ignored
                }
            }
            None => match self.engine.stall_policy() {
                StallPolicy::Ignore => TimeoutOutcome::Ignored,
                StallPolicy::Finish => {
                    self.engine.force_finish();
                    self.check_finished();
                    TimeoutOutcome::Finished
                }
            },
        }
    }

    fn advance(&mut self) {
        self.turn += 1;
        self.check_finished();
    }

    fn check_finished(&mut self) {
        if self.phase == SessionPhase::Active && self.engine.is_finished() {
            self.phase = SessionPhase::Finished;
            let score = self.engine.final_score();
            self.final_score = Some(score);
            info!(
                "{} session finished after {} turns, final score {}",
                self.engine.game_id(),
                self.turn,
                score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Piece;
    use crate::grid::Grid;
    use crate::reproduction::{MosaicLevel, QueueBrick};
    use crate::shape::{Rect, Shape};

    fn mosaic(rows: usize, cols: usize, bricks: usize) -> MosaicLevel {
        MosaicLevel {
            rows,
            cols,
            target_bricks: vec![Rect::new(0, 0, cols, rows, "#A")],
            bricks_queue: (0..bricks)
                .map(|_| QueueBrick::Color("#A".to_string()))
                .collect(),
        }
    }

    fn reproduction_session(rows: usize, cols: usize, bricks: usize) -> GameSession {
        GameSession::from_level(GameId::Reproduction, LevelData::Mosaic(mosaic(rows, cols, bricks)))
            .unwrap()
            .with_seed(17)
    }

    #[test]
    fn test_phases_and_turn_durations() {
        let mut session = reproduction_session(2, 2, 4);
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.turn_duration(), REPRODUCTION_TURN);
        assert!(!session.play(Move::new(0, 0, 0)), "no moves while loading");

        assert!(session.start());
        assert!(!session.start());
        assert_eq!(session.phase(), SessionPhase::Active);

        let block = GameSession::from_level(GameId::BlockClear, LevelData::block_game()).unwrap();
        assert_eq!(block.turn_duration(), BLOCK_CLEAR_TURN);
    }

    #[test]
    fn test_manual_move_advances_turn() {
        let mut session = reproduction_session(2, 2, 4);
        session.start();

        assert!(session.play(Move::new(0, 0, 0)));
        assert_eq!(session.turn(), 1);
        assert!(!session.play(Move::new(0, 0, 0)));
        assert_eq!(session.turn(), 1);
    }

    #[test]
    fn test_stale_timeout_is_noop() {
        let mut session = reproduction_session(2, 2, 4);
        session.start();
        let armed_for = session.turn();

        assert!(session.play(Move::new(0, 1, 1)));
        let filled_before = session.engine().board().filled_count();

        assert_eq!(session.handle_timeout(armed_for), TimeoutOutcome::Stale);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.engine().board().filled_count(), filled_before);
    }

    #[test]
    fn test_timeout_auto_places_and_advances() {
        let mut session = reproduction_session(2, 2, 4);
        session.start();

        match session.handle_timeout(0) {
            TimeoutOutcome::Placed(mv) => {
                assert_eq!(mv.slot, 0);
                assert!(session.engine().board().get(mv.row as usize, mv.col as usize).unwrap().is_some());
            }
            other => panic!("expected placement, got {:?}", other),
        }
        assert_eq!(session.turn(), 1);
    }

    #[test]
    fn test_queue_exhaustion_finishes_with_match_count() {
        let mut session = reproduction_session(2, 2, 4);
        session.start();
        for turn in 0..4 {
            assert!(matches!(
                session.handle_timeout(turn),
                TimeoutOutcome::Placed(_)
            ));
        }
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.final_score(), Some(4));
        assert_eq!(session.handle_timeout(4), TimeoutOutcome::Stale);
    }

    #[test]
    fn test_reproduction_stall_is_ignored() {
        // 1x1 board, two bricks: the second one has nowhere to go
        let mut session = reproduction_session(1, 1, 2);
        session.start();
        assert!(session.play(Move::new(0, 0, 0)));

        assert_eq!(session.handle_timeout(1), TimeoutOutcome::Ignored);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_block_stall_finishes() {
        // The slot-0 piece does not fit as oriented, but a rotation does, so
        // the game is not over until the countdown fires.
        let board = Grid::new(3, 1);
        let bar = Piece::new(Shape::new(vec![vec![1, 1, 1]]).unwrap(), "#D92328");
        let engine = BlockClearEngine::from_parts(board, [Some(bar), None, None], Vec::new());
        let mut session = GameSession::new(Box::new(engine));
        session.start();
        assert!(session.is_active());

        assert_eq!(session.handle_timeout(0), TimeoutOutcome::Finished);
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.final_score(), Some(0));
    }

    #[test]
    fn test_rotation_does_not_consume_turn() {
        let mut session = GameSession::new(Box::new(BlockClearEngine::with_seed(8, 8, 4)));
        session.start();
        assert!(session.rotate(0));
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn test_level_mismatch() {
        let result = GameSession::from_level(GameId::Reproduction, LevelData::block_game());
        assert!(matches!(
            result,
            Err(SessionError::LevelMismatch(GameId::Reproduction))
        ));
    }

    #[test]
    fn test_out_of_bounds_mosaic_rejected() {
        let mut level = mosaic(2, 2, 4);
        level.target_bricks.push(Rect::new(0, usize::MAX, 1, 2, "#B"));
        let result = GameSession::from_level(GameId::Reproduction, LevelData::Mosaic(level));
        assert!(matches!(
            result,
            Err(SessionError::InvalidMosaic(MosaicError::TargetOutOfBounds(1)))
        ));
    }

    #[test]
    fn test_already_finished_engine_finishes_on_start() {
        let mut session = reproduction_session(1, 1, 0);
        session.start();
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.final_score(), Some(0));
    }
}
