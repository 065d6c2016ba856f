//! Room registry and membership rules
//!
//! Rooms are keyed by a short uppercase code. The first member is the host;
//! a room holds at most [`ROOM_CAPACITY`] members and is destroyed as soon as
//! the last one leaves, or when it has been idle for longer than the TTL.

use crate::client_manager::ConnectionId;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{GameId, ROOM_CAPACITY, ROOM_CODE_LEN};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

const ROOM_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Attempts before giving up on finding a free code
const MAX_CODE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    RoomNotFound(String),
    #[error("room {0} is already full")]
    RoomFull(String),
    #[error("you are not a member of room {0}")]
    NotMember(String),
    #[error("only the host can launch a game")]
    NotHost,
    #[error("a game needs {} players to start", ROOM_CAPACITY)]
    RoomNotReady,
    #[error("you are already in room {0}")]
    AlreadyMember(String),
    #[error("no free room code available")]
    CodesExhausted,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    /// Members in join order; the first one is the host
    pub members: Vec<ConnectionId>,
    pub game: Option<GameId>,
    pub last_activity: Instant,
}

impl Room {
    pub fn new(code: String, host: ConnectionId) -> Self {
        Self {
            code,
            members: vec![host],
            game: None,
            last_activity: Instant::now(),
        }
    }

    pub fn host(&self) -> Option<ConnectionId> {
        self.members.first().copied()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn contains(&self, member: ConnectionId) -> bool {
        self.members.contains(&member)
    }

    /// Every member except `member`
    pub fn peers_of(&self, member: ConnectionId) -> Vec<ConnectionId> {
        self.members
            .iter()
            .copied()
            .filter(|id| *id != member)
            .collect()
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() > ttl
    }
}

/// Storage for room records, keyed by room code
pub trait SessionStore: Send {
    fn get(&self, code: &str) -> Option<&Room>;
    fn get_mut(&mut self, code: &str) -> Option<&mut Room>;
    fn insert(&mut self, room: Room);
    fn remove(&mut self, code: &str) -> Option<Room>;
    fn codes(&self) -> Vec<String>;
    fn len(&self) -> usize;

    fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    rooms: HashMap<String, Room>,
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    fn insert(&mut self, room: Room) {
        self.rooms.insert(room.code.clone(), room);
    }

    fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(code)
    }

    fn codes(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }
}

/// What remains of a room after a member left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub code: String,
    pub remaining: Vec<ConnectionId>,
}

impl Departure {
    pub fn room_closed(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Random code over `[0-9A-Z]`
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are case-insensitive on input
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub struct RoomManager<S: SessionStore = InMemorySessionStore> {
    store: S,
    rng: StdRng,
}

impl RoomManager<InMemorySessionStore> {
    pub fn new() -> Self {
        Self::with_store(InMemorySessionStore::default())
    }
}

impl Default for RoomManager<InMemorySessionStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SessionStore> RoomManager<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeds code generation
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Registers a new room hosted by `host` and returns its code
    pub fn create_room(&mut self, host: ConnectionId) -> Result<String, RoomError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code(&mut self.rng);
            if self.store.contains(&code) {
                debug!("Room code {} already taken, retrying", code);
                continue;
            }
            self.store.insert(Room::new(code.clone(), host));
            info!("Client {} created room {}", host, code);
            return Ok(code);
        }
        Err(RoomError::CodesExhausted)
    }

    /// Adds `member` to the room, returning the full member list
    pub fn join_room(
        &mut self,
        code: &str,
        member: ConnectionId,
    ) -> Result<Vec<ConnectionId>, RoomError> {
        let code = normalize_code(code);
        let room = self
            .store
            .get_mut(&code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        if room.contains(member) {
            return Err(RoomError::AlreadyMember(code));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(code));
        }

        room.members.push(member);
        room.touch();
        info!("Client {} joined room {}", member, code);
        Ok(room.members.clone())
    }

    /// Checks that `requester` may start `game` and records it. Returns the
    /// members to notify.
    pub fn launch_game(
        &mut self,
        code: &str,
        requester: ConnectionId,
        game: GameId,
    ) -> Result<Vec<ConnectionId>, RoomError> {
        let code = normalize_code(code);
        let room = self
            .store
            .get_mut(&code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        if !room.contains(requester) {
            return Err(RoomError::NotMember(code));
        }
        if room.host() != Some(requester) {
            return Err(RoomError::NotHost);
        }
        if !room.is_full() {
            return Err(RoomError::RoomNotReady);
        }

        room.game = Some(game);
        room.touch();
        info!("Room {} launching {}", code, game);
        Ok(room.members.clone())
    }

    /// Removes `member` from the room. Empty rooms are destroyed.
    pub fn leave_room(&mut self, code: &str, member: ConnectionId) -> Option<Departure> {
        let code = normalize_code(code);
        let room = self.store.get_mut(&code)?;
        if !room.contains(member) {
            return None;
        }
        room.members.retain(|id| *id != member);
        room.touch();
        let remaining = room.members.clone();

        if remaining.is_empty() {
            self.store.remove(&code);
            info!("Room {} closed", code);
        } else {
            info!("Client {} left room {}", member, code);
        }
        Some(Departure { code, remaining })
    }

    /// Members of `code` if `member` belongs to it. Refreshes the room's
    /// activity time.
    pub fn members_for(
        &mut self,
        code: &str,
        member: ConnectionId,
    ) -> Result<Vec<ConnectionId>, RoomError> {
        let code = normalize_code(code);
        let room = self
            .store
            .get_mut(&code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        if !room.contains(member) {
            return Err(RoomError::NotMember(code));
        }
        room.touch();
        Ok(room.members.clone())
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.store.get(&normalize_code(code))
    }

    /// Removes and returns rooms idle for longer than `ttl`
    pub fn reap_idle(&mut self, ttl: Duration) -> Vec<Room> {
        let idle: Vec<String> = self
            .store
            .codes()
            .into_iter()
            .filter(|code| self.store.get(code).map_or(false, |room| room.is_idle(ttl)))
            .collect();

        idle.into_iter()
            .filter_map(|code| {
                info!("Room {} reaped after inactivity", code);
                self.store.remove(&code)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_uppercase_base36() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_create_room_registers_host() {
        let mut rooms = RoomManager::new().with_seed(1);
        let code = rooms.create_room(7).unwrap();

        let room = rooms.get(&code).unwrap();
        assert_eq!(room.host(), Some(7));
        assert_eq!(room.members, vec![7]);
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn test_codes_are_unique_across_rooms() {
        let mut rooms = RoomManager::new().with_seed(2);
        let mut seen = std::collections::HashSet::new();
        for host in 0..500 {
            assert!(seen.insert(rooms.create_room(host).unwrap()));
        }
        assert_eq!(rooms.len(), 500);
    }

    #[test]
    fn test_join_unknown_room() {
        let mut rooms = RoomManager::new();
        assert_eq!(
            rooms.join_room("ZZZZ", 1),
            Err(RoomError::RoomNotFound("ZZZZ".to_string()))
        );
    }

    #[test]
    fn test_join_full_room() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();

        assert_eq!(rooms.join_room(&code, 2), Ok(vec![1, 2]));
        assert_eq!(rooms.join_room(&code, 3), Err(RoomError::RoomFull(code.clone())));
        assert_eq!(rooms.get(&code).unwrap().members, vec![1, 2]);
    }

    #[test]
    fn test_join_is_case_insensitive() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();
        let lower = format!(" {} ", code.to_lowercase());
        assert!(rooms.join_room(&lower, 2).is_ok());
    }

    #[test]
    fn test_join_twice_rejected() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();
        assert_eq!(
            rooms.join_room(&code, 1),
            Err(RoomError::AlreadyMember(code.clone()))
        );
    }

    #[test]
    fn test_launch_guards() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();

        assert_eq!(
            rooms.launch_game(&code, 1, GameId::BlockClear),
            Err(RoomError::RoomNotReady)
        );
        rooms.join_room(&code, 2).unwrap();
        assert_eq!(
            rooms.launch_game(&code, 2, GameId::BlockClear),
            Err(RoomError::NotHost)
        );
        assert_eq!(
            rooms.launch_game(&code, 3, GameId::BlockClear),
            Err(RoomError::NotMember(code.clone()))
        );
        assert_eq!(
            rooms.launch_game("0000", 1, GameId::BlockClear),
            Err(RoomError::RoomNotFound("0000".to_string()))
        );

        assert_eq!(rooms.launch_game(&code, 1, GameId::Reproduction), Ok(vec![1, 2]));
        assert_eq!(rooms.get(&code).unwrap().game, Some(GameId::Reproduction));
    }

    #[test]
    fn test_leave_keeps_room_until_empty() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();
        rooms.join_room(&code, 2).unwrap();

        let departure = rooms.leave_room(&code, 1).unwrap();
        assert_eq!(departure.remaining, vec![2]);
        assert!(!departure.room_closed());
        assert_eq!(rooms.get(&code).unwrap().host(), Some(2));

        let departure = rooms.leave_room(&code, 2).unwrap();
        assert!(departure.room_closed());
        assert!(rooms.get(&code).is_none());
        assert!(rooms.leave_room(&code, 2).is_none());
    }

    #[test]
    fn test_members_for_requires_membership() {
        let mut rooms = RoomManager::new();
        let code = rooms.create_room(1).unwrap();
        assert_eq!(rooms.members_for(&code, 1), Ok(vec![1]));
        assert_eq!(
            rooms.members_for(&code, 9),
            Err(RoomError::NotMember(code.clone()))
        );
    }

    #[test]
    fn test_reap_idle_rooms() {
        let mut rooms = RoomManager::new();
        let stale = rooms.create_room(1).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        let fresh = rooms.create_room(2).unwrap();

        let reaped = rooms.reap_idle(Duration::from_millis(25));
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].code, stale);
        assert!(rooms.get(&fresh).is_some());
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn test_room_error_messages() {
        assert_eq!(
            RoomError::RoomFull("AB12".to_string()).to_string(),
            "room AB12 is already full"
        );
        assert_eq!(RoomError::RoomNotReady.to_string(), "a game needs 2 players to start");
    }
}
