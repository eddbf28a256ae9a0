//! Environment variable access
//!
//! Empty variables count as unset.

use std::env;
use std::str::FromStr;

pub const SERVER_URL: &str = "VIRTU_SERVER_URL";
pub const WS_URL: &str = "VIRTU_WS_URL";
pub const API_PATH: &str = "VIRTU_API_PATH";
pub const DEFAULT_MODEL: &str = "VIRTU_DEFAULT_MODEL";
pub const VIEWPORT_WIDTH: &str = "VIRTU_VIEWPORT_WIDTH";
pub const VIEWPORT_HEIGHT: &str = "VIRTU_VIEWPORT_HEIGHT";
pub const PLAYER_COMMAND: &str = "VIRTU_PLAYER_COMMAND";
pub const PLAYER_ARGS: &str = "VIRTU_PLAYER_ARGS";
pub const SELECTOR_TRANSPORT: &str = "VIRTU_SELECTOR_TRANSPORT";

/// All variables read by the client.
#[cfg(test)]
pub const ALL: &[&str] = &[
    SERVER_URL,
    WS_URL,
    API_PATH,
    DEFAULT_MODEL,
    VIEWPORT_WIDTH,
    VIEWPORT_HEIGHT,
    PLAYER_COMMAND,
    PLAYER_ARGS,
    SELECTOR_TRANSPORT,
];

/// Value of a variable, `None` when unset or empty.
pub fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parsed value of a variable.
pub fn parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("Invalid {name} '{raw}': {e}"))
        })
        .transpose()
}

/// Whitespace-separated list.
pub fn list(name: &str) -> Option<Vec<String>> {
    var(name).map(|raw| raw.split_whitespace().map(str::to_string).collect())
}
