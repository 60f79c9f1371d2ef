//! `/banned`, `/ban-add`, `/ban-remove` (§10.5, §4.10).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::http::AdminAuth;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.services.banned_list.specs())
}

#[derive(Deserialize)]
pub struct BanRequest {
    pub spec: String,
}

pub async fn add(_admin: AdminAuth, State(state): State<Arc<AppState>>, Json(req): Json<BanRequest>) {
    state.services.banned_list.add(req.spec);
}

pub async fn remove(_admin: AdminAuth, State(state): State<Arc<AppState>>, Json(req): Json<BanRequest>) {
    state.services.banned_list.remove(&req.spec);
}
