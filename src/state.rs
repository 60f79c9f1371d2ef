//! The shared application context passed to every TCP role and HTTP
//! handler, wired up explicitly in `main` and layered on as `axum`
//! extensions / constructor arguments rather than a global singleton.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::services::SharedServices;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub services: SharedServices,
}
