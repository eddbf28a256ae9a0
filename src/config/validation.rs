//! Checks run on the merged configuration

use super::ClientConfig;
use crate::utils::url_validation::{HTTP_SCHEMES, WS_SCHEMES, validate_url};

/// Server and WebSocket URLs must parse with the right schemes, and the API
/// path must be absolute.
pub fn validate_endpoints(config: &ClientConfig) -> Result<(), String> {
    validate_url(&config.server_url, HTTP_SCHEMES)
        .map_err(|e| format!("Invalid server URL '{}': {e}", config.server_url))?;
    validate_url(&config.ws_url, WS_SCHEMES)
        .map_err(|e| format!("Invalid WebSocket URL '{}': {e}", config.ws_url))?;

    if !config.api_path.starts_with('/') {
        return Err(format!(
            "API path must start with '/', got: {}",
            config.api_path
        ));
    }
    Ok(())
}

/// A zero side would scale the avatar down to nothing.
pub fn validate_viewport(width: u32, height: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!(
            "Viewport dimensions must be non-zero, got {width}x{height}"
        ));
    }
    Ok(())
}

/// An empty default model would never match a catalog key.
pub fn validate_default_model(model: &str) -> Result<(), String> {
    if model.trim().is_empty() {
        return Err("Default model must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_viewport() {
        assert!(validate_viewport(1280, 720).is_ok());
        assert!(validate_viewport(0, 720).is_err());
        assert!(validate_viewport(390, 0).is_err());
    }

    #[test]
    fn test_validate_default_model() {
        assert!(validate_default_model("haru").is_ok());
        assert!(validate_default_model("  ").is_err());
    }
}
