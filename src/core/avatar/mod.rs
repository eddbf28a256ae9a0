//! Avatar rendering engine interface.
//!
//! The vector-puppet engine is an external collaborator. The session only
//! needs a small surface from it: pose setters, the expression and motion
//! setters, the lip-sync trigger, the model's own expression list, and
//! teardown. [`AvatarLoader`] produces engines asynchronously from a model
//! description URL.
//!
//! [`HeadlessAvatar`] implements the interface without rendering: it records
//! the state it is driven into and logs every change, which is what the
//! terminal client and the tests use.

mod headless;
pub mod layout;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::audio::AudioItem;
use crate::core::expression::ExpressionDefinition;
use crate::core::protocol::{ExpressionId, MotionSpec};

pub use headless::{AvatarState, DEFAULT_CANVAS, HeadlessAvatar, HeadlessLoader};
pub use layout::{Placement, Size, Viewport};

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised by avatar loading or the speech animation.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// The model description could not be fetched
    #[error("Failed to fetch model description: {0}")]
    Fetch(String),

    /// The model description is not a usable puppet description
    #[error("Invalid model description: {0}")]
    InvalidDescription(String),

    /// The engine refused to animate speech
    #[error("Speech animation failed: {0}")]
    Speak(String),
}

/// Result type for avatar operations.
pub type AvatarResult<T> = Result<T, AvatarError>;

// =============================================================================
// Engine Traits
// =============================================================================

/// A loaded avatar instance.
pub trait AvatarEngine: Send {
    /// Uniform scale factor.
    fn set_scale(&mut self, scale: f32);

    /// Anchor point in normalized model coordinates.
    fn set_anchor(&mut self, x: f32, y: f32);

    /// Position of the anchor on the canvas, in pixels.
    fn set_position(&mut self, x: f32, y: f32);

    /// Apply an expression preset. Unknown ids are the engine's business.
    fn set_expression(&mut self, id: &ExpressionId);

    /// Start a motion.
    fn set_motion(&mut self, motion: &MotionSpec);

    /// Apply backend-supplied model parameters.
    fn set_model(&mut self, params: &serde_json::Value);

    /// Run the lip-sync animation for a clip; the engine voices the clip itself.
    fn speak(&mut self, clip: &AudioItem) -> AvatarResult<()>;

    /// Whether a successful `speak` produces sound. When it does not, the
    /// local output plays the clip audibly instead of muted.
    fn voices_speech(&self) -> bool {
        true
    }

    /// Expression definitions embedded in the model description.
    fn expression_definitions(&self) -> Vec<ExpressionDefinition>;

    /// Unscaled model size used for layout.
    fn natural_size(&self) -> Size;

    /// Release the engine's resources. No other call follows.
    fn destroy(&mut self);
}

/// Boxed trait object for avatar engines.
pub type BoxedAvatar = Box<dyn AvatarEngine>;

/// Asynchronous model loader.
#[async_trait]
pub trait AvatarLoader: Send + Sync {
    /// Load the model described at `url`.
    async fn load(&self, url: &str) -> AvatarResult<BoxedAvatar>;
}
