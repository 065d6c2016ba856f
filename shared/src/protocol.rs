//! JSON event protocol between clients and the room server
//!
//! Every frame is an object `{"event": <name>, "data": <payload>}`. Payload
//! field names are camelCase on the wire.

use crate::engine::GameId;
use crate::generator::{Piece, SLOT_COUNT};
use crate::grid::Grid;
use crate::reproduction::MosaicLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version stamped on every snapshot envelope
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest board side accepted from a peer
pub const MAX_BOARD_DIM: usize = 64;

/// Board size announced for block games
pub const BLOCK_GAME_ROWS: usize = 8;
pub const BLOCK_GAME_COLS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom,
    JoinRoom(String),
    LaunchGame(LaunchRequest),
    SendTetrisState(SnapshotEnvelope),
    SendMessage(ChatRequest),
    LeaveRoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated(String),
    PlayerJoined(String),
    PlayerLeft(String),
    /// The room was removed by the server; members are no longer in any room
    RoomClosed(String),
    RoomError(String),
    GameStarted(GameStarted),
    ReceiveTetrisState(SnapshotEnvelope),
    ReceiveMessage(ChatMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub room_code: String,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub room_code: String,
    pub sender: String,
    pub content: String,
}

/// Chat line as delivered to room members; `date` is epoch milliseconds
/// stamped by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
    pub date: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    #[serde(default)]
    pub message: String,
    pub game_id: GameId,
    pub level_data: LevelData,
}

/// Level payload of `game_started`. Reproduction games carry a full mosaic;
/// block games only the board size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelData {
    Mosaic(MosaicLevel),
    Grid { rows: usize, cols: usize },
}

impl LevelData {
    pub fn block_game() -> Self {
        LevelData::Grid {
            rows: BLOCK_GAME_ROWS,
            cols: BLOCK_GAME_COLS,
        }
    }
}

/// Full externally visible state of one block-game player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub board: Grid,
    pub available_pieces: Vec<Option<Piece>>,
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {0}")]
    Version(u32),
    #[error("board must be a non-empty rectangle of at most 64x64")]
    Board,
    #[error("at most 3 piece slots allowed, got {0}")]
    TooManyPieces(usize),
    #[error("piece in slot {0} has a malformed shape")]
    PieceShape(usize),
}

impl Snapshot {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let rows = self.board.rows();
        let cols = self.board.cols();
        let rectangular = self.board.iter_rows().all(|row| row.len() == cols);
        if rows == 0 || cols == 0 || rows > MAX_BOARD_DIM || cols > MAX_BOARD_DIM || !rectangular
        {
            return Err(SnapshotError::Board);
        }
        if self.available_pieces.len() > SLOT_COUNT {
            return Err(SnapshotError::TooManyPieces(self.available_pieces.len()));
        }
        for (slot, piece) in self.available_pieces.iter().enumerate() {
            if let Some(piece) = piece {
                if !piece.shape.is_well_formed() {
                    return Err(SnapshotError::PieceShape(slot));
                }
            }
        }
        Ok(())
    }
}

/// Versioned wrapper relayed by the server between the two room members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope {
    pub version: u32,
    pub room_code: String,
    pub snapshot: Snapshot,
}

impl SnapshotEnvelope {
    pub fn new(room_code: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            room_code: room_code.into(),
            snapshot,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != PROTOCOL_VERSION {
            return Err(SnapshotError::Version(self.version));
        }
        self.snapshot.validate()
    }
}
