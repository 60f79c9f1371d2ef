//! In-memory lobby/room coordination (§3, §4.5, §4.6), grounded on the
//! teacher's `Games`/`GameRef` `Arc<RwLock<T>>` store pattern: a lobby owns
//! a concurrent map of rooms and a concurrent map of online players, guarded
//! by `parking_lot` locks rather than the async Tokio ones, since every
//! mutation here is synchronous in-memory bookkeeping.

use bytes::BufMut;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::LobbyConfig;
use crate::services::match_engine::{Match, TeamSelection};
use crate::utils::fixed::write_fixed;
use crate::utils::net::EndpointPair;
use crate::utils::types::{ProfileId, RoomId};

/// Maximum number of chat messages retained per lobby (§3).
pub const MAX_MESSAGES: usize = 50;
/// Maximum age of a retained chat message, in days (§3).
pub const MAX_AGE_DAYS: i64 = 5;
/// While a forced-cancellation timestamp is younger than this, the affected
/// player's own re-participation attempts are rejected (§4.6).
pub const FORCED_CANCEL_COOLDOWN_SECS: i64 = 10;

/// A system profile used for messages with no human author (day-rollover
/// announcements, §4.9).
pub const SYSTEM_PROFILE: ProfileId = 0;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub from_profile: ProfileId,
    pub text: String,
    pub to_profile: Option<ProfileId>,
    pub special: Option<[u8; 4]>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn broadcast(from_profile: ProfileId, text: String) -> Self {
        Self {
            from_profile,
            text: truncate_chat(text),
            to_profile: None,
            special: None,
            timestamp: Utc::now(),
        }
    }

    pub fn private(from_profile: ProfileId, to_profile: ProfileId, text: String, special: Option<[u8; 4]>) -> Self {
        Self {
            from_profile,
            text: truncate_chat(text),
            to_profile: Some(to_profile),
            special,
            timestamp: Utc::now(),
        }
    }

    pub fn system(text: String) -> Self {
        Self::broadcast(SYSTEM_PROFILE, text)
    }

    /// Wire layout shared by live chat fan-out and history replay: sender,
    /// recipient (0 if broadcast), unix-epoch timestamp, then a 128-byte
    /// zero-padded text field (the 126-byte wire truncation plus headroom).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 4 + 4 + 128);
        out.put_u32(self.from_profile);
        out.put_u32(self.to_profile.unwrap_or(0));
        out.put_u32(self.timestamp.timestamp().max(0) as u32);
        write_fixed(&mut out, &self.text, 128);
        out
    }
}

/// Chat text is truncated to 126 bytes on the wire (§3).
fn truncate_chat(text: String) -> String {
    if text.len() <= 126 {
        return text;
    }
    let mut end = 126;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// A connected player's live presence within a lobby.
#[derive(Debug, Clone)]
pub struct LobbyPlayer {
    pub profile_id: ProfileId,
    pub name: String,
    pub endpoints: EndpointPair,
    pub room_id: Option<RoomId>,
}

/// Per-player state carried by [`Room`] beyond plain membership.
#[derive(Debug, Clone, Default)]
pub struct RoomPlayerState {
    pub time_cancelled_participation: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// dialect-A has no phase machine of its own; it uses a boolean
    /// ready/not-ready toggle instead. `Idle` stands in for "pregame".
    Idle,
    SideSelect,
    SettingsSelect,
    TeamSelect,
    StripSelect,
    FormationSelect,
    MatchStarted,
    MatchFinished,
    SeriesEnding,
}

pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub password: Option<String>,
    pub players: Vec<ProfileId>,
    pub player_state: HashMap<ProfileId, RoomPlayerState>,
    pub owner: Option<ProfileId>,
    pub match_starter: Option<ProfileId>,
    pub participating_players: Vec<ProfileId>,
    pub phase: RoomPhase,
    pub ready_count: u32,
    pub room_match: Option<Match>,
    /// dialect-A pre-match team picks, staged before `ToggleReady` creates
    /// the running `MatchA` (§4.6 team selection).
    pub pending_team_home: Option<u32>,
    pub pending_team_away: Option<u32>,
    /// dialect-B pre-match team/captain selection, staged before
    /// `MatchState` transitions into `FirstHalf` and captures it into a
    /// fresh `MatchB` (§4.6).
    pub pending_selection: TeamSelection,
}

impl Room {
    pub fn new(id: RoomId, name: String, password: Option<String>) -> Self {
        Self {
            id,
            name,
            password,
            players: Vec::new(),
            player_state: HashMap::new(),
            owner: None,
            match_starter: None,
            participating_players: Vec::new(),
            phase: RoomPhase::Idle,
            ready_count: 0,
            room_match: None,
            pending_team_home: None,
            pending_team_away: None,
            pending_selection: TeamSelection::default(),
        }
    }

    /// Adds a player; the first entrant becomes owner (§3 Room invariant).
    /// Uses `entry` rather than a blind insert so a player re-entering the
    /// room they were never fully removed from keeps an existing forced-
    /// cancellation cooldown instead of having it silently cleared.
    pub fn enter(&mut self, profile_id: ProfileId) {
        if self.players.is_empty() {
            self.owner = Some(profile_id);
        }
        self.players.push(profile_id);
        self.player_state.entry(profile_id).or_insert_with(RoomPlayerState::default);
    }

    /// Removes a player; if they were the owner, ownership passes to the
    /// next remaining player (grounded on the original `Room.exit`).
    /// Returns `true` if the room is now empty and should be destroyed.
    pub fn exit(&mut self, profile_id: ProfileId) -> bool {
        self.players.retain(|&id| id != profile_id);
        self.participating_players.retain(|&id| id != profile_id);
        self.player_state.remove(&profile_id);

        if self.owner == Some(profile_id) {
            self.owner = self.players.first().copied();
        }

        self.players.is_empty()
    }

    pub fn can_participate(&self, profile_id: ProfileId) -> bool {
        if self.participating_players.len() >= 4 {
            return false;
        }
        !self.participation_cancelled(profile_id)
    }

    /// `true` while a forced-cancellation cooldown is still active for this
    /// player (§4.6 "still cancelled" rejection), independent of the
    /// participant-count cap `can_participate` also enforces.
    pub fn participation_cancelled(&self, profile_id: ProfileId) -> bool {
        match self.player_state.get(&profile_id).and_then(|state| state.time_cancelled_participation) {
            Some(cancelled_at) => Utc::now().signed_duration_since(cancelled_at) < ChronoDuration::seconds(FORCED_CANCEL_COOLDOWN_SECS),
            None => false,
        }
    }
}

pub struct Lobby {
    pub id: u32,
    pub name: String,
    pub max_players: u32,
    pub type_code: u8,
    pub show_matches: bool,
    pub check_roster_hash: bool,
    pub players: RwLock<HashMap<String, LobbyPlayer>>,
    pub rooms: RwLock<HashMap<RoomId, Room>>,
    pub chat_history: RwLock<Vec<ChatMessage>>,
    room_ordinal: AtomicU32,
}

impl Lobby {
    pub fn new(id: u32, config: &LobbyConfig) -> Self {
        Self {
            id,
            name: config.name.clone(),
            max_players: config.max_players,
            type_code: config.type_code,
            show_matches: config.show_matches,
            check_roster_hash: config.check_roster_hash,
            players: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            chat_history: RwLock::new(Vec::new()),
            room_ordinal: AtomicU32::new(0),
        }
    }

    /// `typeCode & 0x20` marks a no-stats lobby (§4.7 step 1).
    pub fn is_no_stats(&self) -> bool {
        self.type_code & 0x20 != 0
    }

    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }

    pub fn add_to_chat_history(&self, message: ChatMessage) {
        let mut history = self.chat_history.write();
        history.push(message);
        purge_chat(&mut history);
    }

    /// Bounds chat history to 50 messages / 5 days old (§3, §8 property 3).
    pub fn purge_old_chat(&self) {
        let mut history = self.chat_history.write();
        purge_chat(&mut history);
    }

    /// Allocates the next room id for this lobby (monotonic, §3 invariant).
    pub fn next_room_id(&self) -> RoomId {
        self.room_ordinal.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn add_room(&self, name: String, password: Option<String>) -> RoomId {
        let id = self.next_room_id();
        let room = Room::new(id, name, password);
        self.rooms.write().insert(id, room);
        id
    }

    pub fn room_name_taken(&self, name: &str) -> bool {
        self.rooms.read().values().any(|room| room.name == name)
    }
}

fn purge_chat(history: &mut Vec<ChatMessage>) {
    let cutoff = Utc::now() - ChronoDuration::days(MAX_AGE_DAYS);
    history.retain(|message| message.timestamp >= cutoff);
    if history.len() > MAX_MESSAGES {
        let excess = history.len() - MAX_MESSAGES;
        history.drain(0..excess);
    }
}

/// The full set of server-configured lobbies, keyed by id, matching the
/// teacher's `Games` registry shape (`Arc<RwLock<IntHashMap<...>>>`-style
/// concurrent store, here with a `Vec` since lobby membership is static).
pub struct Lobbies {
    lobbies: Vec<Arc<Lobby>>,
}

impl Lobbies {
    pub fn from_config(configs: &[LobbyConfig]) -> Self {
        let lobbies = configs
            .iter()
            .enumerate()
            .map(|(index, config)| Arc::new(Lobby::new(index as u32, config)))
            .collect();
        Self { lobbies }
    }

    pub fn get(&self, id: u32) -> Option<Arc<Lobby>> {
        self.lobbies.get(id as usize).cloned()
    }

    pub fn all(&self) -> &[Arc<Lobby>] {
        &self.lobbies
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_config() -> LobbyConfig {
        LobbyConfig {
            name: "Test".to_string(),
            max_players: 10,
            type_code: 0,
            show_matches: true,
            check_roster_hash: false,
        }
    }

    #[test]
    fn chat_purge_bounds_length() {
        let lobby = Lobby::new(0, &sample_config());
        for i in 0..60 {
            lobby.add_to_chat_history(ChatMessage::broadcast(1, format!("msg {i}")));
        }
        assert_eq!(lobby.chat_history.read().len(), MAX_MESSAGES);
    }

    #[test]
    fn chat_purge_drops_old_messages() {
        let lobby = Lobby::new(0, &sample_config());
        {
            let mut history = lobby.chat_history.write();
            history.push(ChatMessage {
                from_profile: 1,
                text: "old".to_string(),
                to_profile: None,
                special: None,
                timestamp: Utc::now() - ChronoDuration::days(MAX_AGE_DAYS + 1),
            });
        }
        lobby.purge_old_chat();
        assert!(lobby.chat_history.read().is_empty());
    }

    #[test]
    fn room_ownership_transfers_on_exit() {
        let mut room = Room::new(1, "room".to_string(), None);
        room.enter(1);
        room.enter(2);
        assert_eq!(room.owner, Some(1));

        let emptied = room.exit(1);
        assert!(!emptied);
        assert_eq!(room.owner, Some(2));
    }

    #[test]
    fn room_becomes_empty_when_last_player_leaves() {
        let mut room = Room::new(1, "room".to_string(), None);
        room.enter(1);
        let emptied = room.exit(1);
        assert!(emptied);
        assert_eq!(room.owner, None);
    }

    #[test]
    fn participant_cap_enforced() {
        let mut room = Room::new(1, "room".to_string(), None);
        for id in 1..=4 {
            room.enter(id);
            room.participating_players.push(id);
        }
        assert!(!room.can_participate(5));
    }

    #[test]
    fn forced_cancel_cooldown_blocks_reparticipation() {
        let mut room = Room::new(1, "room".to_string(), None);
        room.enter(1);
        room.player_state.insert(
            1,
            RoomPlayerState {
                time_cancelled_participation: Some(Utc::now()),
            },
        );
        assert!(!room.can_participate(1));
    }
}
