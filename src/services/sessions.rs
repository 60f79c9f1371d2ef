//! The online-users registry (§3 invariant "a user hash appears in at most
//! one Lobby.players at a time", §4.4 "AlreadyOnline"), grounded on the
//! teacher's `Sessions` registry shape: a lock-guarded map keyed by a
//! stable identity, handing out a channel handle connection tasks can use
//! to push frames to each other without blocking on the recipient.
//!
//! The registry is keyed by the user identity hash from the moment
//! `LOGIN_AUTHENTICATE` succeeds — well before a profile is ever selected —
//! so two concurrent not-yet-profiled logins never collide on a shared
//! placeholder key. A profile id only resolves to a hash once
//! `LOGIN_SELECT_PROFILE` calls [`Sessions::rebind_profile`].

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::Frame;
use crate::utils::net::EndpointPair;
use crate::utils::types::ProfileId;

/// A handle a connection task can use to push a frame to another session
/// without waiting for it. Used for cross-connection fan-out: private chat,
/// peer-info exchange, ping resolution, forced participation eviction.
#[derive(Clone)]
pub struct SessionHandle {
    pub profile_id: ProfileId,
    pub name: String,
    pub endpoints: EndpointPair,
    hash: String,
    sender: UnboundedSender<Frame>,
}

impl SessionHandle {
    /// Best-effort send; a closed channel just means the peer already
    /// disconnected, which is not this call's problem to report.
    pub fn send(&self, frame: Frame) {
        let _ = self.sender.send(frame);
    }
}

#[derive(Default)]
pub struct Sessions {
    /// Identity hash -> session handle; the single source of truth for
    /// every connected session (§4.4 step 2: "Already online ⇒
    /// 0xffffff11").
    by_hash: Mutex<HashMap<String, SessionHandle>>,
    /// Profile id -> identity hash, populated once a profile is selected.
    by_profile: Mutex<HashMap<ProfileId, String>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_online(&self, hash: &str) -> bool {
        self.by_hash.lock().contains_key(hash)
    }

    pub fn mark_online(&self, hash: String, name: String, endpoints: EndpointPair, sender: UnboundedSender<Frame>) {
        self.by_hash.lock().insert(
            hash.clone(),
            SessionHandle {
                profile_id: 0,
                name,
                endpoints,
                hash,
                sender,
            },
        );
    }

    /// Removes a session entirely, by its identity hash (§4.4, §5
    /// cancellation). Also drops the profile-id index entry, if any.
    pub fn mark_offline(&self, hash: &str) {
        if let Some(handle) = self.by_hash.lock().remove(hash) {
            self.by_profile.lock().remove(&handle.profile_id);
        }
    }

    pub fn lookup(&self, profile_id: ProfileId) -> Option<SessionHandle> {
        let hash = self.by_profile.lock().get(&profile_id).cloned()?;
        self.by_hash.lock().get(&hash).cloned()
    }

    pub fn count(&self) -> usize {
        self.by_hash.lock().len()
    }

    /// Binds a resolved profile id to the session already registered under
    /// `hash` (§4.4 `LOGIN_SELECT_PROFILE`), indexing it for
    /// [`Sessions::lookup`] by profile id.
    pub fn rebind_profile(&self, hash: &str, profile_id: ProfileId, name: String) {
        let mut by_hash = self.by_hash.lock();
        if let Some(handle) = by_hash.get_mut(hash) {
            let previous = handle.profile_id;
            handle.profile_id = profile_id;
            handle.name = name;
            let mut by_profile = self.by_profile.lock();
            by_profile.remove(&previous);
            by_profile.insert(profile_id, hash.to_string());
        }
    }

    pub fn update_endpoints(&self, profile_id: ProfileId, endpoints: EndpointPair) {
        let Some(hash) = self.by_profile.lock().get(&profile_id).cloned() else { return };
        if let Some(handle) = self.by_hash.lock().get_mut(&hash) {
            handle.endpoints = endpoints;
        }
    }

    /// Snapshot of every currently-registered session (§10.5 `/users/online`).
    pub fn all(&self) -> Vec<SessionHandle> {
        self.by_hash.lock().values().cloned().collect()
    }

    /// Forcibly disconnects a session (§10.5 `/userkill`): closes its outbox
    /// so the connection task's writer loop exits, and clears both registry
    /// maps so the identity hash can log in again immediately.
    pub fn kill(&self, profile_id: ProfileId) -> Option<SessionHandle> {
        let hash = self.by_profile.lock().remove(&profile_id)?;
        self.by_hash.lock().remove(&hash)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_login_detected() {
        let sessions = Sessions::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        sessions.mark_online("hash".to_string(), "alice".to_string(), EndpointPair::default(), tx);
        assert!(sessions.is_online("hash"));
        sessions.mark_offline("hash");
        assert!(!sessions.is_online("hash"));
    }

    #[test]
    fn lookup_finds_registered_session_after_profile_select() {
        let sessions = Sessions::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        sessions.mark_online("hash".to_string(), "bob".to_string(), EndpointPair::default(), tx);
        assert!(sessions.lookup(7).is_none());
        sessions.rebind_profile("hash", 7, "bob".to_string());
        assert!(sessions.lookup(7).is_some());
        assert!(sessions.lookup(8).is_none());
    }

    #[test]
    fn concurrent_pre_profile_logins_do_not_collide() {
        let sessions = Sessions::new();
        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        sessions.mark_online("hash-a".to_string(), "alice".to_string(), EndpointPair::default(), tx1);
        sessions.mark_online("hash-b".to_string(), "bob".to_string(), EndpointPair::default(), tx2);
        assert_eq!(sessions.count(), 2);
        sessions.rebind_profile("hash-a", 1, "alice".to_string());
        sessions.rebind_profile("hash-b", 2, "bob".to_string());
        assert!(sessions.lookup(1).is_some());
        assert!(sessions.lookup(2).is_some());
    }
}
