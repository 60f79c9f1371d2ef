//! `/server-ip` (§10.5, §4.9): triggers a fresh WAN-IP probe in the
//! background and returns immediately, mirroring the startup probe.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::AdminAuth;
use crate::services::wan_ip;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RequeryResponse {
    pub requested: bool,
}

pub async fn requery_ip(_admin: AdminAuth, State(state): State<Arc<AppState>>) -> Json<RequeryResponse> {
    *state.services.wan_ip.server_ip.write() = None;

    let wan_ip_state = state.services.wan_ip.clone();
    let client = state.services.http_client.clone();
    let url = state.config.ip_detect_url.clone();
    let configured = state.config.server_ip.clone();

    tokio::spawn(async move {
        wan_ip::run(wan_ip_state, client, url, configured).await;
    });

    Json(RequeryResponse { requested: true })
}
