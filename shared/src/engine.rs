//! Common contract implemented by both game engines
//!
//! The turn machine in [`crate::session`] only talks to engines through this
//! trait, so the countdown, auto-placement and finish bookkeeping are written
//! once for both games.

use crate::generator::Piece;
use crate::grid::Grid;
use crate::protocol::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which game a room is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    Reproduction,
    #[serde(rename = "tetris")]
    BlockClear,
}

impl GameId {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Reproduction => "reproduction",
            GameId::BlockClear => "tetris",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reproduction" => Ok(GameId::Reproduction),
            "tetris" | "block" | "blockclear" => Ok(GameId::BlockClear),
            other => Err(format!("unknown game '{}'", other)),
        }
    }
}

/// A placement request: put the piece in `slot` with its top-left corner at
/// `(row, col)`. The reproduction game has a single slot, `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub slot: usize,
    pub row: i32,
    pub col: i32,
}

impl Move {
    pub fn new(slot: usize, row: i32, col: i32) -> Self {
        Self { slot, row, col }
    }
}

/// What an engine does when the auto-placer finds no legal destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPolicy {
    /// Leave the turn as it is
    Ignore,
    /// End the game
    Finish,
}

pub trait GameEngine: Send {
    fn game_id(&self) -> GameId;

    /// The working board
    fn board(&self) -> &Grid;

    /// Running score
    fn score(&self) -> u64;

    /// Applies `mv` if it is legal. Illegal moves are a silent no-op and
    /// return `false`.
    fn play(&mut self, mv: Move) -> bool;

    /// Rotates the piece in `slot`. Engines without rotation return `false`.
    fn rotate(&mut self, _slot: usize) -> bool {
        false
    }

    /// Moves the auto-placer may choose from when the countdown expires
    fn auto_moves(&self) -> Vec<Move>;

    fn stall_policy(&self) -> StallPolicy;

    /// Forces the game over, used when a stall finishes the game
    fn force_finish(&mut self);

    fn is_finished(&self) -> bool;

    /// Score recorded when the session finishes
    fn final_score(&self) -> u64;

    /// Pieces the player can place right now, by slot
    fn pieces(&self) -> Vec<Option<Piece>>;

    /// Pattern the player is trying to reproduce, if any
    fn target(&self) -> Option<&Grid> {
        None
    }

    /// Relayable view of this player's state, if the game mirrors boards
    fn snapshot(&self) -> Option<Snapshot> {
        None
    }
}
