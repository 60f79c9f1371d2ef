//! `/stats` (§10.5): a coarse server-health summary over the in-memory and
//! persisted state, grounded on the teacher's `routes/server.rs` summary
//! endpoint shape.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::database::entities::matches;
use crate::http::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub online_sessions: usize,
    pub lobby_count: usize,
    pub total_matches_played: u64,
    pub wan_ip: Option<String>,
}

pub async fn summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    let total_matches_played = matches::Model::count(&state.db).await?;
    Ok(Json(StatsResponse {
        online_sessions: state.services.sessions.count(),
        lobby_count: state.services.lobbies.all().len(),
        total_matches_played,
        wan_ip: state.services.wan_ip.server_ip.read().map(|ip| ip.to_string()),
    }))
}
