//! `/profiles`, `/profiles/:id` (§10.5).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::database::entities::profiles;
use crate::http::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<profiles::Model>>> {
    Ok(Json(profiles::Model::all(&state.db).await?))
}

pub async fn by_id(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> ApiResult<Json<profiles::Model>> {
    let profile = profiles::Model::by_id(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(profile))
}
