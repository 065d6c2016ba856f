//! Types and game logic shared by the room server and the game clients.
//!
//! The server only needs the wire protocol; clients additionally run the
//! engines locally and relay snapshots of their own board to the peer.

pub mod block_clear;
pub mod clear;
pub mod engine;
pub mod generator;
pub mod grid;
pub mod placement;
pub mod protocol;
pub mod reproduction;
pub mod session;
pub mod shape;

pub use block_clear::BlockClearEngine;
pub use engine::{GameEngine, GameId, Move};
pub use generator::Piece;
pub use grid::{Cell, Grid};
pub use protocol::{ClientEvent, ServerEvent, Snapshot, SnapshotEnvelope, PROTOCOL_VERSION};
pub use reproduction::{MosaicLevel, ReproductionEngine};
pub use session::{GameSession, SessionPhase, TimeoutOutcome};
pub use shape::{Rect, Shape};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Length of generated room codes
pub const ROOM_CODE_LEN: usize = 4;

/// Maximum number of players in one room
pub const ROOM_CAPACITY: usize = 2;

/// Current wall-clock time in epoch milliseconds
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
