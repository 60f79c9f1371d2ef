//! Server configuration: a `config.json` file (or the `FS_CONFIG_JSON`
//! environment variable holding the same document), with env-var overrides
//! for a handful of scalar fields layered underneath. Missing file falls
//! back to defaults; a malformed *present* file is the one configuration
//! failure that aborts startup (§7).

use log::LevelFilter;
use serde::Deserialize;
use std::{fs::read_to_string, net::IpAddr, path::Path, time::Duration};

use crate::utils::env;

pub fn load_config() -> Option<Config> {
    if let Ok(raw) = std::env::var(env::CONFIG_JSON) {
        return match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                eprintln!("Failed to parse {} (using defaults): {err:?}", env::CONFIG_JSON);
                None
            }
        };
    }

    let file = Path::new("config.json");
    if !file.exists() {
        return None;
    }

    let data = match read_to_string(file) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to read config.json (using defaults): {err:?}");
            return None;
        }
    };

    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config.json (using defaults): {err:?}");
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: IpAddr,
    pub ports: PortsConfig,
    pub lobbies: Vec<LobbyConfig>,
    pub compare_hash: bool,
    pub roster_enforcement: bool,
    pub store_settings: bool,
    pub show_stats: bool,
    pub count_disconnect_as_loss: bool,
    pub banned_words: Vec<String>,
    pub banned_list_file: String,
    pub ip_detect_url: String,
    pub server_ip: Option<String>,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub rank_recompute_interval: Duration,
    pub database_file: String,
    pub logging: LevelFilter,
    pub admin: AdminConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            ports: PortsConfig::default(),
            lobbies: vec![LobbyConfig::default()],
            compare_hash: true,
            roster_enforcement: true,
            store_settings: true,
            show_stats: true,
            count_disconnect_as_loss: false,
            banned_words: Vec::new(),
            banned_list_file: env::str_env(env::BANNED_LIST_FILE),
            ip_detect_url: "https://api.ipify.org".to_string(),
            server_ip: None,
            rank_recompute_interval: Duration::from_secs(86400),
            database_file: env::str_env(env::DATABASE_FILE),
            logging: env::logging_level(),
            admin: AdminConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// dialect-A and dialect-B clients announce themselves to distinct News
    /// ports, the same way they do for Login, so the single server-list
    /// response (§4.3) can be ordered correctly before either client makes
    /// a single further connection.
    pub news_a: u16,
    pub news_b: u16,
    pub login_a: u16,
    pub login_b: u16,
    pub network_menu: u16,
    pub main_a: u16,
    pub main_b: u16,
    pub http_admin: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            news_a: env::u16_env(("FS_NEWS_A_PORT", 20108)),
            news_b: env::u16_env(("FS_NEWS_B_PORT", 20109)),
            login_a: env::u16_env(("FS_LOGIN_A_PORT", 20110)),
            login_b: env::u16_env(("FS_LOGIN_B_PORT", 20111)),
            network_menu: env::u16_env(("FS_NETWORK_MENU_PORT", 20112)),
            main_a: env::u16_env(("FS_MAIN_A_PORT", 20113)),
            main_b: env::u16_env(("FS_MAIN_B_PORT", 20114)),
            http_admin: env::u16_env(("FS_HTTP_PORT", 8080)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    pub name: String,
    pub max_players: u32,
    pub type_code: u8,
    pub show_matches: bool,
    pub check_roster_hash: bool,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            max_players: 2000,
            type_code: 0,
            show_matches: true,
            check_roster_hash: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 password hash, never a plaintext password.
    pub password_hash: String,
    /// Blowfish key (4-56 bytes) used to transform registration hashes.
    pub registration_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_hash: String::new(),
            registration_key: "fiveserver-default-key".to_string(),
        }
    }
}

/// Serializes/deserializes a [`Duration`] as a plain integer seconds count,
/// matching how the rest of the config favours plain JSON scalars.
mod humantime_duration {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
