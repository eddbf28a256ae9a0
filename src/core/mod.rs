pub mod audio;
pub mod avatar;
pub mod catalog;
pub mod connection;
pub mod expression;
pub mod protocol;
pub mod selectors;
pub mod session;
pub mod transcript;

// Re-export commonly used types for convenience
pub use audio::{
    AudioItem, AudioOutput, AudioQueue, BoxedAudioOutput, ClipId, ClockOutput, CommandOutput,
    PlaybackError, PlaybackEvent, PlaybackOutcome, PlaybackResult,
};

pub use avatar::{
    AvatarEngine, AvatarError, AvatarLoader, AvatarResult, BoxedAvatar, HeadlessAvatar,
    HeadlessLoader, Placement, Size, Viewport,
};

pub use catalog::{
    CatalogClient, CatalogError, CatalogResult, LlmCatalog, ModelCatalog, ModelEntry,
    VoiceCatalog, VoiceSelection,
};

pub use connection::{BackendConnection, ConnectionError, ConnectionEvent, ConnectionResult};

pub use expression::{ExpressionControl, ExpressionDefinition, ExpressionMapping, ExpressionPanel};

pub use protocol::{ClientMessage, ExpressionId, InboundEvent, InboundFrame, MotionSpec};

pub use selectors::{Selector, SelectorKind, Settings};

pub use session::{
    ChatView, Command, NullView, Session, SessionEvent, SessionOptions, SessionStatus,
};

pub use transcript::{ChatEntry, Role, StreamBuffer, Transcript};
