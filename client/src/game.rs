//! Client-side game state: the local session and the mirrored opponent board

use log::{debug, info, warn};
use shared::protocol::{LevelData, SnapshotError};
use shared::session::SessionError;
use shared::{GameId, GameSession, Move, Snapshot, SnapshotEnvelope, TimeoutOutcome};
use std::time::Instant;

/// Latest board received from the other player. Later updates overwrite
/// earlier ones.
#[derive(Debug, Clone)]
pub struct OpponentView {
    pub snapshot: Snapshot,
    pub received_at: Instant,
    pub updates: u64,
}

pub struct ClientGameState {
    session: Option<GameSession>,
    opponent: Option<OpponentView>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            session: None,
            opponent: None,
        }
    }

    /// Builds and starts a session from a `game_started` payload, replacing
    /// any previous game.
    pub fn start(&mut self, game_id: GameId, level: LevelData) -> Result<(), SessionError> {
        let mut session = GameSession::from_level(game_id, level)?;
        session.start();
        info!("Started {} game", game_id);
        self.session = Some(session);
        self.opponent = None;
        Ok(())
    }

    /// Replaces the session, for callers that build their own engine
    pub fn start_with(&mut self, mut session: GameSession) {
        session.start();
        self.session = Some(session);
        self.opponent = None;
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().map_or(false, GameSession::is_active)
    }

    pub fn play(&mut self, mv: Move) -> bool {
        match self.session.as_mut() {
            Some(session) => session.play(mv),
            None => false,
        }
    }

    pub fn rotate(&mut self, slot: usize) -> bool {
        match self.session.as_mut() {
            Some(session) => session.rotate(slot),
            None => false,
        }
    }

    pub fn handle_timeout(&mut self, turn: u64) -> TimeoutOutcome {
        match self.session.as_mut() {
            Some(session) => session.handle_timeout(turn),
            None => TimeoutOutcome::Stale,
        }
    }

    /// Envelope to push to the opponent after a local change
    pub fn outgoing_snapshot(&self, room_code: &str) -> Option<SnapshotEnvelope> {
        let snapshot = self.session.as_ref()?.snapshot()?;
        Some(SnapshotEnvelope::new(room_code, snapshot))
    }

    /// Stores the opponent's latest board
    pub fn apply_opponent(&mut self, envelope: SnapshotEnvelope) -> Result<(), SnapshotError> {
        if let Err(e) = envelope.validate() {
            warn!("Ignoring opponent board: {}", e);
            return Err(e);
        }
        let updates = self.opponent.as_ref().map_or(0, |view| view.updates) + 1;
        debug!("Opponent board update #{}", updates);
        self.opponent = Some(OpponentView {
            snapshot: envelope.snapshot,
            received_at: Instant::now(),
            updates,
        });
        Ok(())
    }

    pub fn opponent(&self) -> Option<&OpponentView> {
        self.opponent.as_ref()
    }

    pub fn clear_opponent(&mut self) {
        self.opponent = None;
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
