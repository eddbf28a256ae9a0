//! Merging of environment variables and YAML overrides

use super::env;
use super::yaml::YamlConfig;
use super::{
    ClientConfig, DEFAULT_API_PATH, DEFAULT_MODEL, DEFAULT_SERVER_URL, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH, SelectorTransport, WS_PATH,
};
use crate::utils::derive_ws_url;

/// Build the final configuration.
///
/// Environment variables (and `.env` values already loaded into the
/// environment) form the base; every value present in `yaml` overrides them.
/// Anything still unset falls back to its default. The WebSocket URL is
/// derived from the server URL last, so a YAML `server.url` moves both.
pub fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let avatar = yaml.avatar.unwrap_or_default();
    let viewport = avatar.viewport.unwrap_or_default();
    let audio = yaml.audio.unwrap_or_default();
    let selectors = yaml.selectors.unwrap_or_default();

    let server_url = server
        .url
        .or_else(|| env::var(env::SERVER_URL))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let ws_url = match server.ws_url.or_else(|| env::var(env::WS_URL)) {
        Some(url) => url,
        None => derive_ws_url(&server_url, WS_PATH)
            .map_err(|e| format!("Cannot derive WebSocket URL from '{server_url}': {e}"))?,
    };

    let api_path = server
        .api_path
        .or_else(|| env::var(env::API_PATH))
        .unwrap_or_else(|| DEFAULT_API_PATH.to_string());

    let default_model = avatar
        .default_model
        .or_else(|| env::var(env::DEFAULT_MODEL))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let viewport_width = match viewport.width {
        Some(width) => width,
        None => env::parse::<u32>(env::VIEWPORT_WIDTH)?.unwrap_or(DEFAULT_VIEWPORT_WIDTH),
    };
    let viewport_height = match viewport.height {
        Some(height) => height,
        None => env::parse::<u32>(env::VIEWPORT_HEIGHT)?.unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
    };

    let player_command = audio
        .player_command
        .filter(|command| !command.trim().is_empty())
        .or_else(|| env::var(env::PLAYER_COMMAND));
    let player_args = audio
        .player_args
        .or_else(|| env::list(env::PLAYER_ARGS))
        .unwrap_or_default();

    let selector_transport = match selectors.transport {
        Some(raw) => raw.parse::<SelectorTransport>()?,
        None => env::parse::<SelectorTransport>(env::SELECTOR_TRANSPORT)?.unwrap_or_default(),
    };

    Ok(ClientConfig {
        server_url,
        ws_url,
        api_path,
        default_model,
        viewport_width,
        viewport_height,
        player_command,
        player_args,
        selector_transport,
    })
}
