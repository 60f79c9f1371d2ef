//! Typed accessors over environment-variable overrides, layered underneath
//! the JSON config file (see [`crate::config`]).

use log::LevelFilter;
use std::str::FromStr;

pub const CONFIG_JSON: &str = "FS_CONFIG_JSON";
pub const LOG_LEVEL: (&str, LevelFilter) = ("FS_LOG_LEVEL", LevelFilter::Info);
pub const DATABASE_FILE: (&str, &str) = ("FS_DATABASE_FILE", "data/fiveserver.db");
pub const BANNED_LIST_FILE: (&str, &str) = ("FS_BANNED_LIST_FILE", "data/banned.yml");

#[inline]
pub fn str_env(pair: (&str, &str)) -> String {
    std::env::var(pair.0).unwrap_or_else(|_| pair.1.to_string())
}

#[inline]
pub fn u16_env(pair: (&str, u16)) -> u16 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<u16>().unwrap_or(pair.1))
}

#[inline]
pub fn bool_env(pair: (&str, bool)) -> bool {
    std::env::var(pair.0).map_or(pair.1, |value| {
        value.to_lowercase().parse::<bool>().unwrap_or(pair.1)
    })
}

pub fn logging_level() -> LevelFilter {
    std::env::var(LOG_LEVEL.0).map_or(LOG_LEVEL.1, |value| {
        LevelFilter::from_str(&value).unwrap_or(LOG_LEVEL.1)
    })
}
