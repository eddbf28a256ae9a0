//! Configuration module for the avatar client
//!
//! This module handles client configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable access
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use virtu_avatar::config::ClientConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ClientConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ClientConfig::from_file(&config_path)?;
//!
//! println!("Connecting to {}", config.ws_url);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

mod env;
mod merge;
mod validation;
mod yaml;

use crate::core::avatar::Viewport;
use crate::core::session::SessionOptions;
use crate::utils::{UrlValidationError, join_path, resolve_reference};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_API_PATH: &str = "/virtupy/api";
pub const DEFAULT_MODEL: &str = "haru";
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

/// Path of the chat socket on the backend.
pub const WS_PATH: &str = "/virtupy/ws";

/// How voice and LLM choices reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorTransport {
    /// POST to the catalog API
    #[default]
    Http,
    /// Send over the chat socket
    Socket,
}

impl FromStr for SelectorTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "socket" | "ws" | "websocket" => Ok(Self::Socket),
            other => Err(format!(
                "Invalid selector transport '{other}', expected 'http' or 'socket'"
            )),
        }
    }
}

impl fmt::Display for SelectorTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Socket => f.write_str("socket"),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base of the backend; relative model URLs resolve against it
    pub server_url: String,
    /// Chat socket URL
    pub ws_url: String,
    /// Path of the catalog API on the server
    pub api_path: String,
    /// Catalog key loaded once models are known
    pub default_model: String,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// External audio player, `None` for silent timed playback
    pub player_command: Option<String>,
    pub player_args: Vec<String>,

    pub selector_transport: SelectorTransport,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            ws_url: format!("ws://127.0.0.1:8000{WS_PATH}"),
            api_path: DEFAULT_API_PATH.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            player_command: None,
            player_args: Vec::new(),
            selector_transport: SelectorTransport::Http,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// The `.env` file is expected to have been loaded into the environment
    /// already (see `main.rs`).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        validation::validate_endpoints(self)?;
        validation::validate_viewport(self.viewport_width, self.viewport_height)?;
        validation::validate_default_model(&self.default_model)?;
        Ok(())
    }

    /// Base URL of the catalog API, without trailing slash.
    pub fn api_base(&self) -> Result<String, UrlValidationError> {
        join_path(&self.server_url, &self.api_path)
    }

    /// Resolve a catalog model URL against the server.
    pub fn model_url(&self, reference: &str) -> Result<String, UrlValidationError> {
        resolve_reference(&self.server_url, reference)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width as f32, self.viewport_height as f32)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            default_model: self.default_model.clone(),
            viewport: self.viewport(),
        }
    }
}
