//! `/users`, `/users/online`, `/userlock`, `/userkill` (§10.5), grounded on
//! the teacher's `routes/players.rs` read/write split.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::database::entities::users;
use crate::http::error::{ApiError, ApiResult};
use crate::http::AdminAuth;
use crate::protocol::{opcodes, Frame};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<users::Model>>> {
    Ok(Json(users::Model::all(&state.db).await?))
}

#[derive(Serialize)]
pub struct OnlineUser {
    pub profile_id: u32,
    pub name: String,
}

pub async fn online(State(state): State<Arc<AppState>>) -> Json<Vec<OnlineUser>> {
    let users = state
        .services
        .sessions
        .all()
        .into_iter()
        .map(|handle| OnlineUser {
            profile_id: handle.profile_id,
            name: handle.name,
        })
        .collect();
    Json(users)
}

#[derive(Deserialize)]
pub struct UserLockRequest {
    pub user_id: u32,
}

#[derive(Serialize)]
pub struct UserLockResponse {
    /// A random 16-digit one-time token used by the registration flow to
    /// re-bind this account to a fresh identity hash (§10.5, §6).
    pub nonce: String,
}

pub async fn lock(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserLockRequest>,
) -> ApiResult<Json<UserLockResponse>> {
    let nonce: u64 = rand::thread_rng().gen_range(1_000_000_000_000_000..=9_999_999_999_999_999);
    let nonce = nonce.to_string();
    users::Model::set_locked(&state.db, req.user_id, Some(nonce.clone())).await?;
    Ok(Json(UserLockResponse { nonce }))
}

#[derive(Deserialize)]
pub struct UserKillRequest {
    pub profile_id: u32,
}

/// Forcibly removes a session from the online registry and pushes a final
/// error frame; this reduced-depth surface has no server-held socket handle
/// to close outright, so the client is expected to drop the connection on
/// receiving the error (§10.5 carve-out).
pub async fn kill(_admin: AdminAuth, State(state): State<Arc<AppState>>, Json(req): Json<UserKillRequest>) -> ApiResult<()> {
    if let Some(handle) = state.services.sessions.kill(req.profile_id) {
        handle.send(Frame::error(opcodes::DISCONNECT, crate::errors::WIRE_INTERNAL));
    } else {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
