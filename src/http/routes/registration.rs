//! `/` registration (§10.5, §6): creates a new `User`, or re-binds an
//! existing locked one when the caller presents the nonce issued by
//! `/userlock`. The posted hash is Blowfish-ECB-encrypted with the
//! configured admin key before it is ever compared or stored.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::database::entities::users;
use crate::http::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::utils::hashing::encrypt_registration_hash;

/// Describes the fields `POST /` expects; this reduced-depth surface
/// returns JSON here rather than the original's HTML form (§10.5 carve-out).
pub async fn form() -> Json<serde_json::Value> {
    Json(json!({
        "fields": ["user", "serial", "hash", "nonce"],
        "note": "nonce is only required when re-binding an account locked via /userlock",
    }))
}

#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub user: String,
    pub serial: String,
    pub hash: String,
    pub nonce: Option<String>,
}

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub username: String,
    pub id: u32,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegistrationRequest>,
) -> ApiResult<Json<RegistrationResponse>> {
    let encrypted_hash = encrypt_registration_hash(state.config.admin.registration_key.as_bytes(), &req.hash);

    if let Some(existing) = users::Model::by_username(&state.db, &req.user).await? {
        match &existing.reset_nonce {
            Some(expected) if req.nonce.as_deref() == Some(expected.as_str()) => {}
            Some(_) => return Err(ApiError::BadRequest("account is locked; a matching nonce is required".into())),
            None => return Err(ApiError::BadRequest("username already registered".into())),
        }
    }

    let user = users::Model::register(&state.db, req.user, req.serial, encrypted_hash).await?;
    Ok(Json(RegistrationResponse { username: user.username, id: user.id }))
}
