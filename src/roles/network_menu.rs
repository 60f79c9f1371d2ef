//! NetworkMenu role (§4.5): the lobby layer above Login.

use bytes::{Buf, BufMut, Bytes};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ServerError, ServerResult};
use crate::protocol::{opcodes, Frame};
use crate::services::lobby::{ChatMessage, LobbyPlayer};
use crate::session::{Router, SessionContext};
use crate::state::AppState;
use crate::utils::fixed::write_fixed;
use crate::utils::net::EndpointPair;

/// How long to wait before replaying bounded chat history to a new joiner,
/// giving the client time to finish rendering the lobby view (§4.5).
const CHAT_REPLAY_DELAY: Duration = Duration::from_secs(3);

pub fn router() -> Router {
    Router::new()
        .route(opcodes::MENU_GET_LOBBIES, get_lobbies)
        .route(opcodes::MENU_SELECT_LOBBY, select_lobby)
        .route(opcodes::MENU_GET_USER_LIST, get_user_list)
        .route(opcodes::MENU_GET_ROOM_LIST, get_room_list)
        .route(opcodes::MENU_FAVOURITE_TEAM, favourite_team)
        .route(opcodes::MENU_FAVOURITE_PLAYER, favourite_player)
        .route(opcodes::MENU_QUICK_MATCH_SEARCH, quick_match_search)
        .route(opcodes::DISCONNECT, disconnect)
}

async fn get_lobbies(state: Arc<AppState>, _ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let mut body = Vec::new();
    for lobby in state.services.lobbies.all() {
        write_fixed(&mut body, &lobby.name, 32);
        body.put_u8(lobby.type_code);
        body.put_u32(lobby.player_count() as u32);
    }
    Ok(Frame::new(opcodes::MENU_GET_LOBBIES + 1, body))
}

async fn select_lobby(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MENU_SELECT_LOBBY + 1;
    if body.len() < 4 + 12 {
        return Err(ServerError::MalformedFrame);
    }

    let lobby_id = body.get_u32();
    let endpoints = EndpointPair::read(&body[..12]).ok_or(ServerError::MalformedFrame)?;

    let (Some(identity), Some(profile)) = (ctx.identity(), ctx.profile()) else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = state.services.lobbies.get(lobby_id) else {
        return Ok(Frame::empty_ok(reply));
    };

    lobby.players.write().insert(
        identity.hash.clone(),
        LobbyPlayer {
            profile_id: profile.profile_id,
            name: profile.name.clone(),
            endpoints,
            room_id: None,
        },
    );
    ctx.set_lobby(lobby_id);
    ctx.set_endpoints(endpoints);
    state.services.sessions.update_endpoints(profile.profile_id, endpoints);

    broadcast_user_list(&state, &lobby, profile.profile_id);

    let outbox = ctx.outbox.clone();
    let history: Vec<ChatMessage> = lobby.chat_history.read().clone();
    tokio::spawn(async move {
        tokio::time::sleep(CHAT_REPLAY_DELAY).await;
        for message in history {
            let _ = outbox.send(Frame::new(opcodes::MAIN_CHAT, message.encode()));
        }
    });

    Ok(Frame::empty_ok(reply))
}

fn user_list_frame(lobby: &crate::services::lobby::Lobby) -> Frame {
    let mut body = Vec::new();
    for player in lobby.players.read().values() {
        body.put_u32(player.profile_id);
        write_fixed(&mut body, &player.name, 32);
        body.put_u32(player.room_id.unwrap_or(0));
    }
    Frame::new(opcodes::MENU_GET_USER_LIST + 1, body)
}

/// Pushes the refreshed user list to every occupant of `lobby` (§4.5: "new
/// player-info frame to all lobby occupants"), including `origin` itself.
pub fn broadcast_user_list(state: &AppState, lobby: &crate::services::lobby::Lobby, _origin: u32) {
    let frame = user_list_frame(lobby);
    for player in lobby.players.read().values() {
        if let Some(handle) = state.services.sessions.lookup(player.profile_id) {
            handle.send(frame.clone());
        }
    }
}

async fn get_user_list(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let Some(lobby_id) = ctx.placement().lobby_id else {
        return Ok(Frame::empty_ok(opcodes::MENU_GET_USER_LIST + 1));
    };
    let Some(lobby) = state.services.lobbies.get(lobby_id) else {
        return Ok(Frame::empty_ok(opcodes::MENU_GET_USER_LIST + 1));
    };
    Ok(user_list_frame(&lobby))
}

async fn get_room_list(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MENU_GET_ROOM_LIST + 1;
    let Some(lobby_id) = ctx.placement().lobby_id else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = state.services.lobbies.get(lobby_id) else {
        return Ok(Frame::empty_ok(reply));
    };

    let mut body = Vec::new();
    for room in lobby.rooms.read().values() {
        body.put_u32(room.id);
        write_fixed(&mut body, &room.name, 32);
        body.put_u8(room.password.is_some() as u8);
        body.put_u32(room.players.len() as u32);
    }
    Ok(Frame::new(reply, body))
}

async fn favourite_team(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    if let Some(profile) = ctx.profile() {
        let team = body.get_u32();
        crate::database::entities::profiles::Model::set_favourite_team(&state.db, profile.profile_id, team).await?;
    }
    Ok(Frame::empty_ok(opcodes::MENU_FAVOURITE_TEAM + 1))
}

async fn favourite_player(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    if let Some(profile) = ctx.profile() {
        let player = body.get_u32();
        crate::database::entities::profiles::Model::set_favourite_player(&state.db, profile.profile_id, player).await?;
    }
    Ok(Frame::empty_ok(opcodes::MENU_FAVOURITE_PLAYER + 1))
}

/// Returns an empty result and removes the caller from its lobby — the
/// client is leaving for a quick-match flow handled entirely client-side
/// in this reduced server (§4.5).
async fn quick_match_search(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    leave_lobby(&state, &ctx);
    Ok(Frame::new(opcodes::MENU_QUICK_MATCH_SEARCH + 1, Bytes::new()))
}

async fn disconnect(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    leave_lobby(&state, &ctx);
    if let Some(identity) = ctx.identity() {
        state.services.sessions.mark_offline(&identity.hash);
    }
    Ok(Frame::empty_ok(opcodes::DISCONNECT + 1))
}

/// Removes the caller from its current lobby, if any, and broadcasts the
/// departure to whoever remains (§4.5 disconnect step, §5 cancellation).
pub fn leave_lobby(state: &AppState, ctx: &SessionContext) {
    let Some(lobby_id) = ctx.placement().lobby_id else { return };
    let Some(lobby) = state.services.lobbies.get(lobby_id) else { return };
    let Some(identity) = ctx.identity() else { return };

    lobby.players.write().remove(&identity.hash);
    ctx.set_room(None);
    broadcast_user_list(state, &lobby, 0);
}
