//! Login role (§4.4): authentication and profile selection.

use bytes::{Buf, BufMut, Bytes};
use chrono::Utc;
use std::sync::Arc;

use crate::database::entities::{profiles, settings};
use crate::database::entities::users;
use crate::database::interface;
use crate::errors::{ServerError, ServerResult};
use crate::protocol::{opcodes, Dialect, Frame};
use crate::services::match_engine::Match;
use crate::session::context::{ActiveProfile, Identity};
use crate::session::{Router, SessionContext};
use crate::state::AppState;
use crate::utils::fixed::{read_fixed, write_fixed};

/// Offsets of the identity/roster hash fields within the 0x3003 body
/// (§4.4): dialect-B's client roster hash sits 10 bytes further in.
const HASH_OFFSET: usize = 32;
const HASH_LEN: usize = 16;
const ROSTER_OFFSET_A: usize = 48;
const ROSTER_OFFSET_B: usize = 58;

pub fn router(dialect: Dialect) -> Router {
    let mut router = Router::new()
        .route(opcodes::LOGIN_AUTHENTICATE, authenticate)
        .route(opcodes::LOGIN_GET_PROFILES, get_profiles)
        .route(opcodes::LOGIN_CREATE_PROFILE, create_profile)
        .route(opcodes::LOGIN_DELETE_PROFILE, delete_profile)
        .route(opcodes::LOGIN_SELECT_PROFILE, select_profile)
        .route(opcodes::LOGIN_SETTINGS_GET_1, settings_get_1)
        .route(opcodes::LOGIN_SETTINGS_GET_2, settings_get_2)
        .route(opcodes::LOGIN_SETTINGS_SET, settings_set);

    router = match dialect {
        Dialect::A => router.route(opcodes::LOGIN_MATCH_SERIES_EXIT, match_series_exit_a),
        Dialect::B => router.route(opcodes::LOGIN_MATCH_SERIES_EXIT, match_series_exit_noop_b),
    };

    router
}

async fn authenticate(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let roster_offset = match ctx.dialect {
        Dialect::A => ROSTER_OFFSET_A,
        Dialect::B => ROSTER_OFFSET_B,
    };
    if body.len() < roster_offset + HASH_LEN {
        return Err(ServerError::MalformedFrame);
    }

    let hash = hex::encode(&body[HASH_OFFSET..HASH_OFFSET + HASH_LEN]);
    let roster_bytes = &body[roster_offset..roster_offset + HASH_LEN];

    let user = users::Model::by_hash(&state.db, &hash).await?.ok_or(ServerError::UnknownUser)?;

    if state.services.sessions.is_online(&hash) {
        return Err(ServerError::AlreadyOnline);
    }

    if state.config.roster_enforcement && has_four_consecutive_zero_bytes(roster_bytes) {
        return Err(ServerError::RosterHashRejected);
    }

    state.services.sessions.mark_online(hash.clone(), user.username.clone(), Default::default(), ctx.outbox.clone());
    ctx.set_identity(Identity {
        user_id: user.id,
        username: user.username,
        hash,
        roster_hash: hex::encode(roster_bytes),
    });

    Ok(Frame::empty_ok(opcodes::LOGIN_AUTHENTICATE + 1))
}

/// Heuristic from §4.4 step 3: a real MD5 roster hash essentially never
/// contains four consecutive zero bytes; clients that skip hashing
/// altogether tend to send all-zero or partially-zero buffers.
fn has_four_consecutive_zero_bytes(bytes: &[u8]) -> bool {
    bytes.windows(4).any(|window| window.iter().all(|&b| b == 0))
}

const PROFILE_RECORD_LEN: usize = 4 + 32 + 4 + 4 + 8 + 4;

fn write_profile_record(out: &mut Vec<u8>, profile: Option<&profiles::Model>, show_stats: bool) {
    match profile {
        Some(p) => {
            out.put_u32(p.id);
            write_fixed(out, &p.name, 32);
            out.put_i32(if show_stats { p.points } else { 0 });
            out.put_u32(if show_stats { p.rank } else { 0 });
            out.put_i64(if show_stats { p.seconds_played } else { 0 });
            out.put_u32(if show_stats { p.disconnects } else { 0 });
        }
        None => {
            out.put_u32(0);
            write_fixed(out, "", 32);
            out.put_i32(0);
            out.put_u32(0);
            out.put_i64(0);
            out.put_u32(0);
        }
    }
}

async fn get_profiles(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let identity = ctx.identity().ok_or(ServerError::UnknownUser)?;
    let profiles = profiles::Model::for_user(&state.db, identity.user_id).await?;

    let mut by_ordinal: [Option<&profiles::Model>; 3] = [None, None, None];
    for profile in &profiles {
        if let Some(slot) = by_ordinal.get_mut(profile.ordinal as usize) {
            *slot = Some(profile);
        }
    }

    let mut body = Vec::with_capacity(PROFILE_RECORD_LEN * 3);
    for slot in by_ordinal {
        write_profile_record(&mut body, slot, state.config.show_stats);
    }

    Ok(Frame::new(opcodes::LOGIN_GET_PROFILES + 1, body))
}

async fn create_profile(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    let identity = ctx.identity().ok_or(ServerError::UnknownUser)?;
    if body.len() < 1 + 32 {
        return Err(ServerError::MalformedFrame);
    }
    let ordinal = body[0] as i16;
    let name = read_fixed(&body[1..33]);

    if profiles::Model::by_name(&state.db, &name).await?.is_some() {
        return Err(ServerError::ProfileNameTaken);
    }

    let created = profiles::Model::create(&state.db, identity.user_id, ordinal, name).await?;

    let mut out = Vec::with_capacity(4);
    out.put_u32(created.id);
    Ok(Frame::new(opcodes::LOGIN_CREATE_PROFILE + 1, out))
}

async fn delete_profile(state: Arc<AppState>, _ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let profile_id = (&body[0..4]).get_u32();
    profiles::Model::soft_delete(&state.db, profile_id).await?;
    Ok(Frame::empty_ok(opcodes::LOGIN_DELETE_PROFILE + 1))
}

async fn select_profile(state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> ServerResult<Frame> {
    if body.len() < 4 {
        return Err(ServerError::MalformedFrame);
    }
    let profile_id = (&body[0..4]).get_u32();

    if let Some(profile) = profiles::Model::by_id(&state.db, profile_id).await? {
        if let Some(identity) = ctx.identity() {
            state.services.sessions.rebind_profile(&identity.hash, profile.id, profile.name.clone());
        }
        ctx.set_profile(ActiveProfile {
            profile_id: profile.id,
            name: profile.name,
        });
    }

    Ok(Frame::empty_ok(opcodes::LOGIN_SELECT_PROFILE + 1))
}

fn write_blob(out: &mut Vec<u8>, blob: &[u8]) {
    out.put_u16(blob.len() as u16);
    out.extend_from_slice(blob);
}

async fn settings_get_1(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    settings_get(state, ctx, opcodes::LOGIN_SETTINGS_GET_1, true).await
}

async fn settings_get_2(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    settings_get(state, ctx, opcodes::LOGIN_SETTINGS_GET_2, false).await
}

async fn settings_get(state: Arc<AppState>, ctx: Arc<SessionContext>, opcode: u16, first: bool) -> ServerResult<Frame> {
    let mut body = Vec::new();
    if state.config.store_settings {
        if let Some(profile) = ctx.profile() {
            if let Some(row) = settings::Model::by_profile(&state.db, profile.profile_id).await? {
                write_blob(&mut body, if first { &row.settings1 } else { &row.settings2 });
            } else {
                write_blob(&mut body, &[]);
            }
        } else {
            write_blob(&mut body, &[]);
        }
    } else {
        write_blob(&mut body, &[]);
    }
    Ok(Frame::new(opcode + 1, body))
}

async fn settings_set(state: Arc<AppState>, ctx: Arc<SessionContext>, mut body: Bytes) -> ServerResult<Frame> {
    if state.config.store_settings {
        if let Some(profile) = ctx.profile() {
            if body.len() < 2 {
                return Err(ServerError::MalformedFrame);
            }
            let len1 = body.get_u16() as usize;
            if body.len() < len1 + 2 {
                return Err(ServerError::MalformedFrame);
            }
            let settings1 = body.split_to(len1).to_vec();
            let len2 = body.get_u16() as usize;
            if body.len() < len2 {
                return Err(ServerError::MalformedFrame);
            }
            let settings2 = body.split_to(len2).to_vec();

            settings::Model::set(&state.db, profile.profile_id, settings1, settings2).await?;
        }
    }
    Ok(Frame::empty_ok(opcodes::LOGIN_SETTINGS_SET + 1))
}

/// dialect-B's `3087` is explicitly a no-op (§9 open question resolution):
/// shared logic with dialect-A's series-exit handler is intentionally not
/// reused.
async fn match_series_exit_noop_b(_state: Arc<AppState>, _ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    Ok(Frame::empty_ok(opcodes::LOGIN_MATCH_SERIES_EXIT + 1))
}

/// dialect-A series-exit (§4.6, §9): a match whose both exit flags are `1`
/// (both sides quit) is disregarded; anything else — one side exiting, or a
/// clean finish with no exit flags set at all — is recorded. This resolves
/// the open question's ambiguous parenthesisation in favour of the reading
/// consistent with the surrounding prose: "both-side exit flags == 1" is
/// the sole condition for disregarding a match.
async fn match_series_exit_a(state: Arc<AppState>, ctx: Arc<SessionContext>, _body: Bytes) -> ServerResult<Frame> {
    let reply = opcodes::LOGIN_MATCH_SERIES_EXIT + 1;
    let placement = ctx.placement();
    let (Some(lobby_id), Some(room_id)) = (placement.lobby_id, placement.room_id) else {
        return Ok(Frame::empty_ok(reply));
    };
    let Some(lobby) = state.services.lobbies.get(lobby_id) else {
        return Ok(Frame::empty_ok(reply));
    };

    let taken = {
        let mut rooms = lobby.rooms.write();
        rooms.get_mut(&room_id).and_then(|room| room.room_match.take())
    };

    let Some(Match::A(played)) = taken else {
        return Ok(Frame::empty_ok(reply));
    };

    if played.home_exit == Some(1) && played.away_exit == Some(1) {
        return Ok(Frame::empty_ok(reply));
    }

    if lobby.is_no_stats() {
        return Ok(Frame::empty_ok(reply));
    }

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

    Ok(Frame::empty_ok(reply))
}
