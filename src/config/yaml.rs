use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   url: "http://127.0.0.1:8000"
///   ws_url: "ws://127.0.0.1:8000/virtupy/ws"
///   api_path: "/virtupy/api"
///
/// avatar:
///   default_model: "haru"
///   viewport:
///     width: 1280
///     height: 720
///
/// audio:
///   player_command: "ffplay"
///   player_args: ["-nodisp", "-autoexit", "-loglevel", "quiet"]
///
/// selectors:
///   transport: "http"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub avatar: Option<AvatarYaml>,
    pub audio: Option<AudioYaml>,
    pub selectors: Option<SelectorsYaml>,
}

/// Backend endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub url: Option<String>,
    pub ws_url: Option<String>,
    pub api_path: Option<String>,
}

/// Avatar settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AvatarYaml {
    pub default_model: Option<String>,
    pub viewport: Option<ViewportYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewportYaml {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Local playback from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    /// External player; clips are timed silently when unset
    pub player_command: Option<String>,
    pub player_args: Option<Vec<String>>,
}

/// Selector push settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SelectorsYaml {
    /// `http` or `socket`
    pub transport: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  url: "https://avatar.example.com"
  ws_url: "wss://avatar.example.com/socket"
  api_path: "/api"

avatar:
  default_model: "hiyori"
  viewport:
    width: 390
    height: 844

audio:
  player_command: "ffplay"
  player_args: ["-nodisp", "-autoexit"]

selectors:
  transport: "socket"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.url.as_deref(), Some("https://avatar.example.com"));
        assert_eq!(server.ws_url.as_deref(), Some("wss://avatar.example.com/socket"));
        assert_eq!(server.api_path.as_deref(), Some("/api"));

        let avatar = config.avatar.unwrap();
        assert_eq!(avatar.default_model.as_deref(), Some("hiyori"));
        let viewport = avatar.viewport.unwrap();
        assert_eq!(viewport.width, Some(390));
        assert_eq!(viewport.height, Some(844));

        let audio = config.audio.unwrap();
        assert_eq!(audio.player_command.as_deref(), Some("ffplay"));
        assert_eq!(audio.player_args.unwrap().len(), 2);

        assert_eq!(config.selectors.unwrap().transport.as_deref(), Some("socket"));
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
avatar:
  viewport:
    width: 800
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.is_none());
        let viewport = config.avatar.unwrap().viewport.unwrap();
        assert_eq!(viewport.width, Some(800));
        assert!(viewport.height.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.avatar.is_none());
        assert!(config.audio.is_none());
        assert!(config.selectors.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(&config_path, "server:\n  url: \"http://localhost:9000\"\n").unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();
        assert_eq!(
            config.server.unwrap().url,
            Some("http://localhost:9000".to_string())
        );
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
