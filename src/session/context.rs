//! Per-connection mutable state (§4.2, §5): everything a handler needs to
//! read or update about "this" connection as it moves through the
//! news -> login -> lobby -> room -> match state machine. Shared behind an
//! `Arc` so handlers (which only borrow it for the duration of one call)
//! and the connection's own read loop can both see updates.

use parking_lot::Mutex;
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{Dialect, Frame};
use crate::utils::net::EndpointPair;
use crate::utils::types::{LobbyId, ProfileId, RoomId, UserId};

/// The authenticated identity bound to a connection once `LOGIN_AUTHENTICATE`
/// succeeds; absent before that point and on failed/not-yet-attempted login.
#[derive(Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// The user identity hash (§3, §4.4): the stable key used for
    /// single-login enforcement, the session registry, and lobby
    /// membership. Distinct from `roster_hash`, which is only used for
    /// roster-hash enforcement at login.
    pub hash: String,
    pub roster_hash: String,
}

/// The profile bound to a connection once `LOGIN_SELECT_PROFILE` succeeds.
#[derive(Clone)]
pub struct ActiveProfile {
    pub profile_id: ProfileId,
    pub name: String,
}

/// Where in a lobby/room this connection currently sits, if anywhere.
#[derive(Clone, Copy, Default)]
pub struct Placement {
    pub lobby_id: Option<LobbyId>,
    pub room_id: Option<RoomId>,
}

pub struct SessionContext {
    pub peer_addr: SocketAddr,
    pub dialect: Dialect,
    pub outbox: UnboundedSender<Frame>,

    identity: Mutex<Option<Identity>>,
    profile: Mutex<Option<ActiveProfile>>,
    placement: Mutex<Placement>,
    endpoints: Mutex<Option<EndpointPair>>,
}

impl SessionContext {
    pub fn new(peer_addr: SocketAddr, dialect: Dialect, outbox: UnboundedSender<Frame>) -> Self {
        Self {
            peer_addr,
            dialect,
            outbox,
            identity: Mutex::new(None),
            profile: Mutex::new(None),
            placement: Mutex::new(Placement::default()),
            endpoints: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.lock().clone()
    }

    pub fn set_identity(&self, identity: Identity) {
        *self.identity.lock() = Some(identity);
    }

    pub fn profile(&self) -> Option<ActiveProfile> {
        self.profile.lock().clone()
    }

    pub fn set_profile(&self, profile: ActiveProfile) {
        *self.profile.lock() = Some(profile);
    }

    pub fn placement(&self) -> Placement {
        *self.placement.lock()
    }

    pub fn set_lobby(&self, lobby_id: LobbyId) {
        let mut placement = self.placement.lock();
        placement.lobby_id = Some(lobby_id);
        placement.room_id = None;
    }

    pub fn set_room(&self, room_id: Option<RoomId>) {
        self.placement.lock().room_id = room_id;
    }

    pub fn endpoints(&self) -> Option<EndpointPair> {
        *self.endpoints.lock()
    }

    pub fn set_endpoints(&self, endpoints: EndpointPair) {
        *self.endpoints.lock() = Some(endpoints);
    }
}
