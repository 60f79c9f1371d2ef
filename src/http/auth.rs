//! HTTP Basic auth for the mutating admin endpoints (§10.5), grounded on
//! the teacher's `Auth<V>` extractor shape but simplified to a single
//! username/password-hash pair rather than a role hierarchy, since this
//! reduced surface has exactly one privilege level.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;
use crate::utils::hashing::verify_password;

/// Extractor guarding the admin-mutation routes. Successful extraction
/// proves the request carried valid HTTP Basic credentials for the
/// configured admin account; the extractor carries no further payload.
pub struct AdminAuth;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    Missing,
    #[error("invalid admin credentials")]
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Missing => StatusCode::UNAUTHORIZED,
            AuthError::Invalid => StatusCode::UNAUTHORIZED,
        };
        let mut response = (status, self.to_string()).into_response();
        response.headers_mut().insert(
            axum::http::header::WWW_AUTHENTICATE,
            axum::http::HeaderValue::from_static("Basic realm=\"fiveserver-admin\""),
        );
        response
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::Missing)?;

        let encoded = header.strip_prefix("Basic ").ok_or(AuthError::Missing)?;
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
            .map_err(|_| AuthError::Missing)?;
        let credentials = String::from_utf8(decoded).map_err(|_| AuthError::Missing)?;
        let (username, password) = credentials.split_once(':').ok_or(AuthError::Missing)?;

        if username != state.config.admin.username {
            return Err(AuthError::Invalid);
        }
        if !verify_password(password, &state.config.admin.password_hash) {
            return Err(AuthError::Invalid);
        }

        Ok(AdminAuth)
    }
}
