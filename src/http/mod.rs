//! Admin/registration HTTP surface (§10.5), grounded on the teacher's
//! `servers::http` module: an `axum` router wired directly against
//! [`AppState`] rather than a global singleton, with routes split by
//! concern the way the teacher splits `routes/*.rs`.

mod auth;
mod error;
mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::state::AppState;

pub use auth::AdminAuth;
pub use error::ApiError;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(routes::registration::form).post(routes::registration::submit))
        .route("/users", get(routes::users::list))
        .route("/users/online", get(routes::users::online))
        .route("/profiles", get(routes::profiles::list))
        .route("/profiles/:id", get(routes::profiles::by_id))
        .route("/stats", get(routes::stats::summary))
        .route("/banned", get(routes::banned::list))
        .route("/ban-add", post(routes::banned::add))
        .route("/ban-remove", post(routes::banned::remove))
        .route("/userlock", post(routes::users::lock))
        .route("/userkill", post(routes::users::kill))
        .route("/server-ip", post(routes::server::requery_ip))
}

pub async fn serve(state: Arc<AppState>) {
    let port = state.config.ports.http_admin;
    let addr = std::net::SocketAddr::from((state.config.host, port));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind admin HTTP server on {addr}: {err:?}");
            return;
        }
    };

    info!("admin HTTP server listening on {addr}");
    if let Err(err) = axum::serve(listener, router().with_state(state)).await {
        error!("admin HTTP server exited: {err:?}");
    }
}
