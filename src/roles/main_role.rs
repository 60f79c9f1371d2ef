//! Main role (§4.6): room lifecycle and the per-room match sub-state
//! machine. The dominant part of the protocol; dialect-A and dialect-B
//! diverge sharply here so most handlers are registered per dialect.

use bytes::{Buf, BufMut, Bytes};
use chrono::Utc;
use std::sync::Arc;

use crate::database::entities::profiles;
use crate::database::interface;
use crate::errors::{ServerError, ServerResult};
use crate::protocol::{opcodes, Dialect, Frame};
use crate::services::lobby::{Lobby, Room, RoomPhase};
use crate::services::match_engine::{Match, MatchA, MatchB, MatchState};
use crate::session::{Router, SessionContext};
use crate::state::AppState;
use crate::utils::fixed::write_fixed;
use crate::utils::types::{ProfileId, RoomId};

pub fn router(dialect: Dialect) -> Router {
    let mut router = Router::new()
        .route(opcodes::MAIN_CREATE_ROOM, create_room)
        .route(opcodes::MAIN_EXIT_ROOM, exit_room)
        .route(opcodes::MAIN_JOIN, join)
        .route(opcodes::MAIN_CHAT, chat)
        .route(opcodes::MAIN_ROOM_RENAME, rename_room)
        .route(opcodes::MAIN_OWNER_CHANGE, owner_change);

    router = match dialect {
        Dialect::A => router
            .route(opcodes::MAIN_CHALLENGE_RESPONSE, challenge_response_a)
            .route(opcodes::A_TOGGLE_READY, toggle_ready_a)
            .route(opcodes::A_TEAM_SELECT, team_select_a)
            .route(opcodes::A_GOAL_SCORED, goal_scored_a)
            .route(opcodes::A_MATCH_EXIT, match_exit_a)
            .route(opcodes::MAIN_PING, ping_a),
        Dialect::B => router
            .route(opcodes::B_TOGGLE_READY, toggle_ready_b)
            .route(opcodes::B_TEAM_SELECT, team_select_b)
            .route(opcodes::B_GOAL_SCORED, goal_scored_b)
            .route(opcodes::B_MATCH_STATE, match_state_b)
            .route(opcodes::B_CLOCK, clock_b)
            .route(opcodes::MAIN_FORCED_CANCEL, forced_cancel_b),
    };

    router
}

fn current_lobby(state: &AppState, ctx: &SessionContext) -> Option<Arc<Lobby>> {
    state.services.lobbies.get(ctx.placement().lobby_id?)
}

fn broadcast_room_list(state: &AppState, lobby: &Lobby) {
    let mut body = Vec::new();
    for room in lobby.rooms.read().values() {
        body.put_u32(room.id);
        write_fixed(&mut body, &room.name, 32);
        body.put_u8(room.password.is_some() as u8);
        body.put_u32(room.players.len() as u32);
    }
    let frame = Frame::new(opcodes::MENU_GET_ROOM_LIST + 1, body);
    for player in lobby.players.read().values() {
        if let Some(handle) = state.services.sessions.lookup(player.profile_id) {
            handle.send(frame.clone());
        }
    }
}

fn set_lobby_player_room(lobby: &Lobby, profile_id: u32, room_id: Option<RoomId>) {
    for player in lobby.players.write().values_mut() {
        if player.profile_id == profile_id {
            player.room_id = room_id;
        }
    }
}

async fn create_room(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_CREATE_ROOM + 1;
    if body.len() < 32 + 1 {
        return Err(ServerError::MalformedFrame);
    }
    let name = crate::utils::fixed::read_fixed(&body[0..32]);
    let has_password = body[32] != 0;
    let password = if has_password && body.len() >= 33 + 32 {
        Some(crate::utils::fixed::read_fixed(&body[33..65]))
    } else {
        None
    };

    let Some(profile) = ctx.profile() else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };

    if lobby.room_name_taken(&name) {
        return Err(ServerError::RoomNameTaken);
    }

    let room_id = lobby.add_room(name, password);
    {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            room.enter(profile.profile_id);
        }
    }
    ctx.set_room(Some(room_id));
    set_lobby_player_room(&lobby, profile.profile_id, Some(room_id));
    broadcast_room_list(&state, &lobby);

    let mut out = Vec::with_capacity(4);
    out.put_u32(room_id);
    Ok(Frame::new(reply, out))
}

async fn exit_room(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    leave_room(&state, &ctx);
    Ok(Frame::empty_ok(opcodes::MAIN_EXIT_ROOM + 1))
}

/// Shared by explicit `ExitRoom` and connection teardown (§5 cancellation
/// step 3): leaves the current room, reassigning ownership or destroying
/// the room if it's now empty, then broadcasts the update.
pub fn leave_room(state: &AppState, ctx: &SessionContext) {
    let Some(lobby) = current_lobby(state, ctx) else { return };
    let Some(room_id) = ctx.placement().room_id else { return };
    let Some(profile) = ctx.profile() else { return };

    let emptied = {
        let mut rooms = lobby.rooms.write();
        match rooms.get_mut(&room_id) {
            Some(room) => {
                let emptied = room.exit(profile.profile_id);
                if emptied {
                    rooms.remove(&room_id);
                }
                emptied
            }
            None => true,
        }
    };
    let _ = emptied;

    ctx.set_room(None);
    set_lobby_player_room(&lobby, profile.profile_id, None);
    broadcast_room_list(state, &lobby);
}

/// §5 cancellation steps 1-2: on transport close, before the room/lobby
/// exit sequence runs, finalize whatever match the disconnecting player was
/// mid-way through. There is no later opcode to defer to once the
/// connection is gone (dialect-A's `0x3087` series-exit never arrives), so
/// this increments `disconnects` immediately and, if configured, records
/// the match as a loss for the disconnecting side right away rather than
/// leaving it to a follow-up call that will never come.
pub async fn handle_room_disconnect(state: &AppState, lobby: &Lobby, room_id: RoomId, profile_id: ProfileId) {
    let taken = {
        let mut rooms = lobby.rooms.write();
        rooms.get_mut(&room_id).and_then(|room| room.room_match.take())
    };
    let Some(played) = taken else { return };

    let _ = profiles::Model::add_disconnect(&state.db, profile_id).await;

    if lobby.is_no_stats() || !state.config.count_disconnect_as_loss {
        return;
    }

    match played {
        Match::A(mut played) => {
            ensure_loss_a(&mut played, played.home_profile == profile_id);
            let _ = record_finished_match_a(state, &played).await;
        }
        Match::B(mut played) => {
            let disconnecting_is_home = played.selection.home_captain == Some(profile_id);
            ensure_loss_b(&mut played, disconnecting_is_home);
            let _ = record_match_b_result(state, lobby, &played).await;
        }
    }
}

/// Nudges the score so `disconnecting_is_home`'s side does not win or draw,
/// the configured "count disconnect as loss" outcome (§5 cancellation
/// step 2).
fn ensure_loss_a(played: &mut MatchA, disconnecting_is_home: bool) {
    if disconnecting_is_home {
        if played.score_home >= played.score_away {
            played.score_away = played.score_home + 1;
        }
    } else if played.score_away >= played.score_home {
        played.score_home = played.score_away + 1;
    }
}

/// As [`ensure_loss_a`], but for dialect-B's per-half score counters: bumps
/// the winning side's first-half tally, which `HalfScores::total` sums
/// regardless of which half it lands in.
fn ensure_loss_b(played: &mut MatchB, disconnecting_is_home: bool) {
    let home_total = played.home_scores.total();
    let away_total = played.away_scores.total();
    if disconnecting_is_home {
        if home_total >= away_total {
            played.away_scores.first_half += home_total - away_total + 1;
        }
    } else if away_total >= home_total {
        played.home_scores.first_half += away_total - home_total + 1;
    }
}

async fn record_finished_match_a(state: &AppState, played: &MatchA) -> ServerResult<()> {
    interface::record_match_a(
        &state.db,
        played.home_profile,
        played.away_profile,
        played.score_home as i32,
        played.score_away as i32,
        played.home_team_id,
        played.away_team_id,
    )
    .await?;

    let duration = Utc::now().signed_duration_since(played.start).num_seconds().max(0);
    for profile_id in [played.home_profile, played.away_profile] {
        let (wins, draws, losses) = interface::profile_results(&state.db, profile_id).await?;
        interface::add_play_time_and_recompute(&state.db, profile_id, duration, wins, draws, losses).await?;
    }
    Ok(())
}

async fn join(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_JOIN + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let room_id = body.get_u32();
    let password = if ctx.dialect == Dialect::B && body.len() >= 32 {
        Some(crate::utils::fixed::read_fixed(&body[..32]))
    } else {
        None
    };

    let Some(profile) = ctx.profile() else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };

    {
        let rooms = lobby.rooms.read();
        let Some(room) = rooms.get(&room_id) else {
            return Ok(Frame::empty_ok(reply));
        };
        if ctx.dialect == Dialect::B && room.password.is_some() && room.password != password {
            return Err(ServerError::RoomPasswordWrong);
        }
        if room.players.len() >= 4 {
            return Err(ServerError::RoomFull);
        }
    }

    {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            if room.participation_cancelled(profile.profile_id) {
                return Err(ServerError::StillCancelled);
            }
            room.enter(profile.profile_id);
            if room.can_participate(profile.profile_id) {
                room.participating_players.push(profile.profile_id);
            }
        }
    }
    ctx.set_room(Some(room_id));
    set_lobby_player_room(&lobby, profile.profile_id, Some(room_id));

    exchange_peer_info(&state, &lobby, room_id, profile.profile_id);
    broadcast_room_list(&state, &lobby);

    Ok(Frame::empty_ok(reply))
}

/// Pushes each existing room member's endpoint tuples to the joiner
/// (0x4330) and the joiner's endpoint tuples to each existing member
/// (0x4347), so clients can attempt direct peer-to-peer connections
/// (§4.6 "Challenge / Join").
fn exchange_peer_info(state: &AppState, lobby: &Lobby, room_id: RoomId, joiner: u32) {
    let members: Vec<u32> = lobby
        .rooms
        .read()
        .get(&room_id)
        .map(|room| room.players.iter().copied().filter(|&id| id != joiner).collect())
        .unwrap_or_default();

    let Some(joiner_handle) = state.services.sessions.lookup(joiner) else { return };

    for member in members {
        let Some(member_handle) = state.services.sessions.lookup(member) else { continue };

        let mut to_joiner = Vec::with_capacity(12);
        member_handle.endpoints.write(&mut to_joiner);
        joiner_handle.send(Frame::new(opcodes::MAIN_PEER_INFO, to_joiner));

        let mut to_member = Vec::with_capacity(12);
        joiner_handle.endpoints.write(&mut to_member);
        member_handle.send(Frame::new(opcodes::MAIN_PEER_INFO_ACK, to_member));
    }
}

/// dialect-A only: accepting sends an acknowledgement to the challenger;
/// declining evicts them from the room (§4.6).
async fn challenge_response_a(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_CHALLENGE_RESPONSE + 1;
    if body.len() < 1 + 4 {
        return Err(ServerError::MalformedFrame);
    }
    let accept = body[0] != 0;
    let challenger = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);

    if !accept {
        if let Some(lobby) = current_lobby(&state, &ctx) {
            if let Some(room_id) = ctx.placement().room_id {
                let emptied = {
                    let mut rooms = lobby.rooms.write();
                    rooms.get_mut(&room_id).map(|room| room.exit(challenger)).unwrap_or(false)
                };
                if emptied {
                    lobby.rooms.write().remove(&room_id);
                }
                set_lobby_player_room(&lobby, challenger, None);
                broadcast_room_list(&state, &lobby);
            }
        }
    } else if let Some(handle) = state.services.sessions.lookup(challenger) {
        handle.send(Frame::empty_ok(reply));
    }

    Ok(Frame::empty_ok(reply))
}

async fn toggle_ready_a(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::A_TOGGLE_READY + 1;
    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(room_id) = ctx.placement().room_id else {
        return Ok(Frame::empty_ok(reply));
    };

    let mut rooms = lobby.rooms.write();
    let Some(room) = rooms.get_mut(&room_id) else {
        return Ok(Frame::empty_ok(reply));
    };

    room.ready_count += 1;
    if room.participating_players.len() == 2 && room.ready_count as usize >= room.participating_players.len() {
        room.ready_count = 0;
        if room.room_match.is_none() {
            let home = room.participating_players[0];
            let away = room.participating_players[1];
            room.room_match = Some(Match::A(MatchA::new(
                home,
                away,
                room.pending_team_home.unwrap_or(0),
                room.pending_team_away.unwrap_or(0),
            )));
            room.phase = RoomPhase::MatchStarted;
        }
        let frame = Frame::empty_ok(reply);
        for &player in &room.players {
            if let Some(handle) = state.services.sessions.lookup(player) {
                handle.send(frame.clone());
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn team_select_a(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::A_TEAM_SELECT + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let team_id = body.get_u32();

    if let (Some(lobby), Some(room_id), Some(profile)) = (current_lobby(&state, &ctx), ctx.placement().room_id, ctx.profile()) {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            let is_owner = room.owner == Some(profile.profile_id);
            match &mut room.room_match {
                Some(Match::A(m)) if is_owner => m.home_team_id = team_id,
                Some(Match::A(m)) => m.away_team_id = team_id,
                _ if is_owner => room.pending_team_home = Some(team_id),
                _ => room.pending_team_away = Some(team_id),
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn goal_scored_a(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::A_GOAL_SCORED + 1;
    if body.is_empty() {
        return Err(ServerError::MalformedFrame);
    }
    let home_side = body[0] == 0;

    if let (Some(lobby), Some(room_id)) = (current_lobby(&state, &ctx), ctx.placement().room_id) {
        let mut rooms = lobby.rooms.write();
        if let Some(Some(Match::A(m))) = rooms.get_mut(&room_id).map(|room| &mut room.room_match) {
            m.goal(home_side);
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn match_exit_a(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::A_MATCH_EXIT + 1;
    if body.is_empty() {
        return Err(ServerError::MalformedFrame);
    }
    let exit_type = body[0];

    if let (Some(lobby), Some(room_id), Some(profile)) = (current_lobby(&state, &ctx), ctx.placement().room_id, ctx.profile()) {
        let mut rooms = lobby.rooms.write();
        if let Some(Some(Match::A(m))) = rooms.get_mut(&room_id).map(|room| &mut room.room_match) {
            if m.home_profile == profile.profile_id {
                m.home_exit = Some(exit_type);
            } else if m.away_profile == profile.profile_id {
                m.away_exit = Some(exit_type);
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn ping_a(state: Arc<AppState>, _ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_PING + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let target = body.get_u32();

    let mut out = Vec::with_capacity(12);
    if let Some(handle) = state.services.sessions.lookup(target) {
        handle.endpoints.write(&mut out);
    } else {
        out.resize(12, 0);
    }
    Ok(Frame::new(reply, out))
}

async fn toggle_ready_b(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::B_TOGGLE_READY + 1;
    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(room_id) = ctx.placement().room_id else {
        return Ok(Frame::empty_ok(reply));
    };

    let mut rooms = lobby.rooms.write();
    let Some(room) = rooms.get_mut(&room_id) else {
        return Ok(Frame::empty_ok(reply));
    };

    room.ready_count += 1;
    if (room.ready_count as usize) < room.participating_players.len().max(1) {
        return Ok(Frame::empty_ok(reply));
    }
    room.ready_count = 0;

    room.phase = match room.phase {
        RoomPhase::Idle => RoomPhase::SideSelect,
        RoomPhase::SideSelect => RoomPhase::SettingsSelect,
        RoomPhase::SettingsSelect => RoomPhase::TeamSelect,
        RoomPhase::TeamSelect => RoomPhase::StripSelect,
        RoomPhase::StripSelect => RoomPhase::FormationSelect,
        RoomPhase::FormationSelect => RoomPhase::MatchStarted,
        RoomPhase::MatchFinished => RoomPhase::SeriesEnding,
        other => other,
    };

    let frame = Frame::new(reply, vec![room.phase as u8].into_iter().collect::<Vec<u8>>());
    for &player in &room.players {
        if let Some(handle) = state.services.sessions.lookup(player) {
            handle.send(frame.clone());
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn team_select_b(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::B_TEAM_SELECT + 1;
    if body.len() < 1 + 4 {
        return Err(ServerError::MalformedFrame);
    }
    let home_side = body[0] == 0;
    let team_id = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);

    if let (Some(lobby), Some(room_id), Some(profile)) = (current_lobby(&state, &ctx), ctx.placement().room_id, ctx.profile()) {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            if home_side {
                room.pending_selection.home_team_id = Some(team_id);
                room.pending_selection.home_captain.get_or_insert(profile.profile_id);
            } else {
                room.pending_selection.away_team_id = Some(team_id);
                room.pending_selection.away_captain.get_or_insert(profile.profile_id);
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn goal_scored_b(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::B_GOAL_SCORED + 1;
    if body.is_empty() {
        return Err(ServerError::MalformedFrame);
    }
    let home_side = body[0] == 0;

    if let Some(lobby) = current_lobby(&state, &ctx) {
        if let Some(room_id) = ctx.placement().room_id {
            {
                let mut rooms = lobby.rooms.write();
                if let Some(Some(Match::B(m))) = rooms.get_mut(&room_id).map(|room| &mut room.room_match) {
                    m.goal(home_side);
                }
            }
            broadcast_room_list(&state, &lobby);
        }
    }

    Ok(Frame::empty_ok(reply))
}

fn match_state_from_wire(value: u8) -> Option<MatchState> {
    Some(match value {
        0 => MatchState::NotStarted,
        1 => MatchState::FirstHalf,
        2 => MatchState::HalfTime,
        3 => MatchState::SecondHalf,
        4 => MatchState::BeforeExtraTime,
        5 => MatchState::EtFirstHalf,
        6 => MatchState::EtBreak,
        7 => MatchState::EtSecondHalf,
        8 => MatchState::BeforePenalties,
        9 => MatchState::Penalties,
        10 => MatchState::Finished,
        _ => return None,
    })
}

async fn match_state_b(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::B_MATCH_STATE + 1;
    if body.is_empty() {
        return Err(ServerError::MalformedFrame);
    }
    let Some(new_state) = match_state_from_wire(body[0]) else {
        return Err(ServerError::MalformedFrame);
    };

    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(room_id) = ctx.placement().room_id else {
        return Ok(Frame::empty_ok(reply));
    };

    let finished_match = {
        let mut rooms = lobby.rooms.write();
        let Some(room) = rooms.get_mut(&room_id) else {
            return Ok(Frame::empty_ok(reply));
        };

        if new_state == MatchState::FirstHalf && room.room_match.is_none() {
            room.room_match = Some(Match::B(MatchB::new(room.pending_selection.clone())));
        }

        let mut finished = None;
        if let Some(Match::B(m)) = &mut room.room_match {
            m.state = new_state;
            if new_state == MatchState::Finished {
                finished = room.room_match.take();
                room.phase = RoomPhase::MatchFinished;
            }
        }
        finished
    };

    if let Some(Match::B(played)) = finished_match {
        record_match_b_result(&state, &lobby, &played).await?;
    }

    Ok(Frame::empty_ok(reply))
}

async fn record_match_b_result(state: &AppState, lobby: &Lobby, played: &MatchB) -> ServerResult<()> {
    if lobby.is_no_stats() {
        return Ok(());
    }

    let mut participants = Vec::new();
    if let Some(home) = played.selection.home_captain {
        participants.push(interface::MatchParticipant { profile_id: home, home: true });
    }
    for extra in &played.selection.home_extra {
        participants.push(interface::MatchParticipant { profile_id: *extra, home: true });
    }
    if let Some(away) = played.selection.away_captain {
        participants.push(interface::MatchParticipant { profile_id: away, home: false });
    }
    for extra in &played.selection.away_extra {
        participants.push(interface::MatchParticipant { profile_id: *extra, home: false });
    }

    let score_home = played.home_scores.total() as i32;
    let score_away = played.away_scores.total() as i32;
    let team_home = played.selection.home_team_id.unwrap_or(0);
    let team_away = played.selection.away_team_id.unwrap_or(0);

    let profile_ids: Vec<u32> = participants.iter().map(|p| p.profile_id).collect();
    interface::record_match_b(&state.db, participants, score_home, score_away, team_home, team_away).await?;

    let duration = Utc::now().signed_duration_since(played.start).num_seconds().max(0);
    for profile_id in profile_ids {
        let (wins, draws, losses) = interface::profile_results(&state.db, profile_id).await?;
        interface::add_play_time_and_recompute(&state.db, profile_id, duration, wins, draws, losses).await?;
    }

    Ok(())
}

async fn clock_b(_state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::B_CLOCK + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let minute = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);

    if let (Some(room_id), Some(lobby_id)) = (ctx.placement().room_id, ctx.placement().lobby_id) {
        let _ = (room_id, lobby_id, minute);
    }

    Ok(Frame::empty_ok(reply))
}

async fn forced_cancel_b(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_FORCED_CANCEL + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let target = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);

    if let (Some(lobby), Some(room_id), Some(profile)) = (current_lobby(&state, &ctx), ctx.placement().room_id, ctx.profile()) {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            if room.owner == Some(profile.profile_id) {
                room.participating_players.retain(|&id| id != target);
                if let Some(player_state) = room.player_state.get_mut(&target) {
                    player_state.time_cancelled_participation = Some(Utc::now());
                }
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

async fn rename_room(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_ROOM_RENAME + 1;
    if body.len() < 32 {
        return Err(ServerError::MalformedFrame);
    }
    let new_name = crate::utils::fixed::read_fixed(&body[0..32]);

    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };
    if lobby.room_name_taken(&new_name) {
        return Err(ServerError::RoomNameTaken);
    }
    if let Some(room_id) = ctx.placement().room_id {
        if let Some(room) = lobby.rooms.write().get_mut(&room_id) {
            room.name = new_name;
        }
        broadcast_room_list(&state, &lobby);
    }

    Ok(Frame::empty_ok(reply))
}

async fn owner_change(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_OWNER_CHANGE + 1;
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let new_owner = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);

    if let (Some(lobby), Some(room_id)) = (current_lobby(&state, &ctx), ctx.placement().room_id) {
        let mut rooms = lobby.rooms.write();
        if let Some(room) = rooms.get_mut(&room_id) {
            if room.players.contains(&new_owner) {
                room.owner = Some(new_owner);
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

/// Chat (§4.6): three modes selected by a 2-byte type prefix. dialect-A
/// replaces a banned-word match with a bracketed warning before fan-out.
async fn chat(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::MAIN_CHAT + 1;
    if body.len() < 2 {
        return Err(ServerError::MalformedFrame);
    }
    let kind = [body[0], body[1]];
    let Some(profile) = ctx.profile() else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = current_lobby(&state, &ctx) else {
        return Ok(Frame::empty_ok(reply));
    };

    if kind == opcodes::chat_kind::PRIVATE {
        if body.len() < 2 + 4 + 4 {
            return Err(ServerError::MalformedFrame);
        }
        let target = u32::from_be_bytes([body[2], body[3], body[4], body[5]]);
        let special = [body[6], body[7], body.get(8).copied().unwrap_or(0), body.get(9).copied().unwrap_or(0)];
        let text = apply_banned_words(&state, ctx.dialect, crate::utils::fixed::read_fixed(&body[10..]));

        let message = crate::services::lobby::ChatMessage::private(profile.profile_id, target, text, Some(special));
        lobby.add_to_chat_history(message.clone());

        let frame = Frame::new(opcodes::MAIN_CHAT, message.encode());
        if let Some(handle) = state.services.sessions.lookup(target) {
            handle.send(frame.clone());
        }
        ctx.outbox.send(frame).ok();
    } else if kind == opcodes::chat_kind::LOBBY_BROADCAST {
        let text = apply_banned_words(&state, ctx.dialect, crate::utils::fixed::read_fixed(&body[2..]));
        let message = crate::services::lobby::ChatMessage::broadcast(profile.profile_id, text);
        lobby.add_to_chat_history(message.clone());

        let frame = Frame::new(opcodes::MAIN_CHAT, message.encode());
        for player in lobby.players.read().values() {
            if let Some(handle) = state.services.sessions.lookup(player.profile_id) {
                handle.send(frame.clone());
            }
        }
    } else if let Some(room_id) = ctx.placement().room_id {
        let text = apply_banned_words(&state, ctx.dialect, crate::utils::fixed::read_fixed(&body[2..]));
        let message = crate::services::lobby::ChatMessage::broadcast(profile.profile_id, text);
        let frame = Frame::new(opcodes::MAIN_CHAT, message.encode());

        let members: Vec<u32> = lobby
            .rooms
            .read()
            .get(&room_id)
            .map(|room| room.players.clone())
            .unwrap_or_default();
        for member in members {
            if let Some(handle) = state.services.sessions.lookup(member) {
                handle.send(frame.clone());
            }
        }
    }

    Ok(Frame::empty_ok(reply))
}

fn apply_banned_words(state: &AppState, dialect: Dialect, text: String) -> String {
    if dialect != Dialect::A {
        return text;
    }
    let lower = text.to_lowercase();
    for word in &state.config.banned_words {
        if !word.is_empty() && lower.contains(&word.to_lowercase()) {
            return format!("[filtered: message contained a banned word]");
        }
    }
    text
}
