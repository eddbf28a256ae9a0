use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{AvatarEngine, AvatarError, AvatarLoader, AvatarResult, BoxedAvatar, Size};
use crate::core::audio::{AudioItem, ClipId};
use crate::core::expression::ExpressionDefinition;
use crate::core::protocol::{ExpressionId, MotionSpec};

/// Canvas size assumed for models loaded without a renderer.
pub const DEFAULT_CANVAS: Size = Size {
    width: 1000.0,
    height: 1600.0,
};

// =============================================================================
// Model Description
// =============================================================================

/// The parts of a `.model3.json` (Cubism 3/4) or `.model.json` (Cubism 2)
/// description the headless engine reads.
#[derive(Debug, Default, Deserialize)]
struct ModelDescription {
    #[serde(rename = "FileReferences")]
    file_references: Option<FileReferences>,

    /// Cubism 2 moc path
    model: Option<String>,

    /// Cubism 2 expression list
    #[serde(default)]
    expressions: Vec<ExpressionDefinition>,
}

#[derive(Debug, Default, Deserialize)]
struct FileReferences {
    #[serde(rename = "Moc")]
    moc: Option<String>,

    #[serde(rename = "Expressions", default)]
    expressions: Vec<ExpressionDefinition>,
}

impl ModelDescription {
    fn parse(body: &str) -> AvatarResult<Self> {
        let description: Self = serde_json::from_str(body)
            .map_err(|e| AvatarError::InvalidDescription(e.to_string()))?;

        let has_moc = description
            .file_references
            .as_ref()
            .and_then(|refs| refs.moc.as_ref())
            .or(description.model.as_ref())
            .is_some();
        if !has_moc {
            return Err(AvatarError::InvalidDescription(
                "no moc reference (FileReferences.Moc or model)".to_string(),
            ));
        }
        Ok(description)
    }

    fn into_expressions(self) -> Vec<ExpressionDefinition> {
        match self.file_references {
            Some(refs) if !refs.expressions.is_empty() => refs.expressions,
            _ => self.expressions,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Everything the session has driven the avatar into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvatarState {
    pub scale: f32,
    pub anchor: (f32, f32),
    pub position: (f32, f32),
    pub expression: Option<ExpressionId>,
    pub motion: Option<MotionSpec>,
    pub model_params: Option<serde_json::Value>,
    pub last_clip: Option<ClipId>,
    pub destroyed: bool,
}

/// Avatar engine without a renderer.
#[derive(Debug)]
pub struct HeadlessAvatar {
    source: String,
    size: Size,
    expressions: Vec<ExpressionDefinition>,
    state: AvatarState,
}

impl HeadlessAvatar {
    pub fn new(source: impl Into<String>, size: Size, expressions: Vec<ExpressionDefinition>) -> Self {
        Self {
            source: source.into(),
            size,
            expressions,
            state: AvatarState {
                scale: 1.0,
                ..AvatarState::default()
            },
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> &AvatarState {
        &self.state
    }
}

impl AvatarEngine for HeadlessAvatar {
    fn set_scale(&mut self, scale: f32) {
        self.state.scale = scale;
    }

    fn set_anchor(&mut self, x: f32, y: f32) {
        self.state.anchor = (x, y);
    }

    fn set_position(&mut self, x: f32, y: f32) {
        tracing::debug!("Avatar placed at ({x:.1}, {y:.1}) scale {:.3}", self.state.scale);
        self.state.position = (x, y);
    }

    fn set_expression(&mut self, id: &ExpressionId) {
        tracing::info!("Avatar expression: {id}");
        self.state.expression = Some(id.clone());
    }

    fn set_motion(&mut self, motion: &MotionSpec) {
        tracing::info!("Avatar motion: {}", motion.group);
        self.state.motion = Some(motion.clone());
    }

    fn set_model(&mut self, params: &serde_json::Value) {
        tracing::debug!("Avatar model parameters: {params}");
        self.state.model_params = Some(params.clone());
    }

    fn speak(&mut self, clip: &AudioItem) -> AvatarResult<()> {
        if self.state.destroyed {
            return Err(AvatarError::Speak(format!("{} is destroyed", self.source)));
        }
        tracing::debug!("Avatar speaking {}", clip.id());
        self.state.last_clip = Some(clip.id());
        Ok(())
    }

    fn voices_speech(&self) -> bool {
        false
    }

    fn expression_definitions(&self) -> Vec<ExpressionDefinition> {
        self.expressions.clone()
    }

    fn natural_size(&self) -> Size {
        self.size
    }

    fn destroy(&mut self) {
        tracing::info!("Destroying avatar {}", self.source);
        self.state.destroyed = true;
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Loads model descriptions over HTTP(S), from `file://` URLs or plain paths.
#[derive(Debug, Clone)]
pub struct HeadlessLoader {
    http: reqwest::Client,
    canvas: Size,
}

impl HeadlessLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            canvas: DEFAULT_CANVAS,
        }
    }

    /// Override the size reported by loaded models.
    pub fn with_canvas(mut self, canvas: Size) -> Self {
        self.canvas = canvas;
        self
    }

    async fn fetch(&self, url: &str) -> AvatarResult<String> {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                let response = self
                    .http
                    .get(parsed)
                    .send()
                    .await
                    .map_err(|e| AvatarError::Fetch(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(AvatarError::Fetch(format!("{url} returned {status}")));
                }
                response
                    .text()
                    .await
                    .map_err(|e| AvatarError::Fetch(e.to_string()))
            }
            Ok(parsed) if parsed.scheme() == "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| AvatarError::Fetch(format!("not a local path: {url}")))?;
                read_file(path).await
            }
            Ok(parsed) => Err(AvatarError::Fetch(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            ))),
            Err(_) => read_file(PathBuf::from(url)).await,
        }
    }
}

async fn read_file(path: PathBuf) -> AvatarResult<String> {
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AvatarError::Fetch(format!("{}: {e}", path.display())))
}

#[async_trait]
impl AvatarLoader for HeadlessLoader {
    async fn load(&self, url: &str) -> AvatarResult<BoxedAvatar> {
        let body = self.fetch(url).await?;
        let description = ModelDescription::parse(&body)?;
        let expressions = description.into_expressions();
        tracing::info!(
            "Loaded model description {url} ({} expressions)",
            expressions.len()
        );
        Ok(Box::new(HeadlessAvatar::new(url, self.canvas, expressions)))
    }
}
