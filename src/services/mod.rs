pub mod banned_list;
pub mod lobby;
pub mod match_engine;
pub mod rating;
pub mod sessions;
pub mod tasks;
pub mod wan_ip;

use std::sync::Arc;

use crate::config::Config;
use banned_list::BannedList;
use lobby::Lobbies;
use sessions::Sessions;
use wan_ip::WanIpState;

/// The process-wide, lock-free-to-construct bundle of shared services
/// every connection task and HTTP handler is given a reference to (§9:
/// "global process state... lives in a single server context passed by
/// reference to every handler; no hidden singletons").
pub struct Services {
    /// `Arc`-wrapped like [`Services::wan_ip`], so the day-change
    /// maintenance loop can own a handle independent of the rest of the
    /// service bundle.
    pub lobbies: Arc<Lobbies>,
    pub sessions: Sessions,
    pub banned_list: BannedList,
    /// Independently `Arc`-wrapped so the probe loop can be (re)spawned as
    /// its own task without needing the whole [`Services`] bundle alive
    /// (§10.5 `/server-ip` requery).
    pub wan_ip: Arc<WanIpState>,
    pub http_client: reqwest::Client,
}

impl Services {
    pub fn new(config: &Config) -> Self {
        Self {
            lobbies: Arc::new(Lobbies::from_config(&config.lobbies)),
            sessions: Sessions::new(),
            banned_list: BannedList::from_specs(&load_banned_list_file(&config.banned_list_file)),
            wan_ip: Arc::new(WanIpState::default()),
            http_client: reqwest::Client::new(),
        }
    }
}

fn load_banned_list_file(path: &str) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|contents| contents.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub type SharedServices = Arc<Services>;
