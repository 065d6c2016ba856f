//! Chat and board relay between room members
//!
//! The relay never interprets game state. Chat lines are stamped with the
//! server clock and echoed to every member; board snapshots are checked for
//! shape and forwarded unchanged to the other members only.

use crate::client_manager::ConnectionId;
use shared::protocol::{ChatMessage, ChatRequest, SnapshotError};
use shared::{ServerEvent, SnapshotEnvelope};

/// One event and the connections it goes to
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub event: ServerEvent,
}

/// Builds the `receive_message` broadcast for a chat line. The sender is
/// included in `members` and receives its own echo.
pub fn chat(members: Vec<ConnectionId>, request: ChatRequest, date: u64) -> Delivery {
    Delivery {
        targets: members,
        event: ServerEvent::ReceiveMessage(ChatMessage {
            sender: request.sender,
            content: request.content,
            date,
        }),
    }
}

/// Builds the `receive_tetris_state` delivery for everyone but `sender`
pub fn board(
    members: &[ConnectionId],
    sender: ConnectionId,
    envelope: SnapshotEnvelope,
) -> Result<Delivery, SnapshotError> {
    envelope.validate()?;
    Ok(Delivery {
        targets: members.iter().copied().filter(|id| *id != sender).collect(),
        event: ServerEvent::ReceiveTetrisState(envelope),
    })
}
