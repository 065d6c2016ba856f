//! Per-turn countdown
//!
//! Each arm replaces the previous deadline, so re-arming is how a countdown
//! is cancelled. Expiry yields the turn key it was armed with, and the game
//! session discards keys that are no longer current.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Default)]
pub struct TurnTimer {
    armed: Option<(u64, Instant)>,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown of `duration` for `turn`, replacing any other
    pub fn arm(&mut self, turn: u64, duration: Duration) {
        self.armed = Some((turn, Instant::now() + duration));
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Turn the countdown is armed for
    pub fn turn(&self) -> Option<u64> {
        self.armed.map(|(turn, _)| turn)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|(_, deadline)| deadline.saturating_duration_since(Instant::now()))
    }

    /// Waits for the armed deadline and returns its turn. Never completes
    /// while disarmed. The timer disarms itself on expiry.
    pub async fn expired(&mut self) -> u64 {
        match self.armed {
            Some((turn, deadline)) => {
                sleep_until(deadline).await;
                self.armed = None;
                turn
            }
            None => std::future::pending().await,
        }
    }
}
