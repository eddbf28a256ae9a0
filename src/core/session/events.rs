use crate::core::audio::PlaybackEvent;
use crate::core::avatar::{AvatarResult, BoxedAvatar, Viewport};
use crate::core::catalog::{CatalogResult, LlmCatalog, ModelCatalog, VoiceCatalog};
use crate::core::protocol::{ClientMessage, InboundFrame};

/// Everything the session reacts to, delivered one at a time.
///
/// Completions of work the session asked for (catalog fetches, model loads,
/// selector pushes) come back as events too, so the session never waits.
pub enum SessionEvent {
    // Connection
    Frame(InboundFrame),
    Disconnected(Option<String>),

    // User input
    UserSubmit(String),
    SelectModel(String),
    SelectLanguage(String),
    SelectSpeaker(String),
    SelectLlm(String),
    ClickExpression(String),
    Resize(Viewport),

    // Playback
    Playback(PlaybackEvent),

    // Completions
    ModelsFetched(CatalogResult<ModelCatalog>),
    VoicesFetched(CatalogResult<VoiceCatalog>),
    LlmsFetched(CatalogResult<LlmCatalog>),
    SpeakersFetched {
        language: String,
        result: CatalogResult<VoiceCatalog>,
    },
    ModelLoaded {
        generation: u64,
        key: String,
        result: AvatarResult<BoxedAvatar>,
    },
    VoicePushed(CatalogResult<()>),
    LlmPushed(CatalogResult<()>),
}

impl std::fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Frame(InboundFrame::Audio(data)) => {
                write!(f, "Frame(Audio, {} bytes)", data.len())
            }
            SessionEvent::Frame(InboundFrame::Structured(text)) => {
                write!(f, "Frame(Structured, {} chars)", text.len())
            }
            SessionEvent::Disconnected(reason) => write!(f, "Disconnected({reason:?})"),
            SessionEvent::UserSubmit(text) => write!(f, "UserSubmit({text:?})"),
            SessionEvent::SelectModel(key) => write!(f, "SelectModel({key})"),
            SessionEvent::SelectLanguage(language) => write!(f, "SelectLanguage({language})"),
            SessionEvent::SelectSpeaker(speaker) => write!(f, "SelectSpeaker({speaker})"),
            SessionEvent::SelectLlm(model) => write!(f, "SelectLlm({model})"),
            SessionEvent::ClickExpression(name) => write!(f, "ClickExpression({name})"),
            SessionEvent::Resize(viewport) => {
                write!(f, "Resize({}x{})", viewport.width, viewport.height)
            }
            SessionEvent::Playback(event) => write!(f, "Playback({event:?})"),
            SessionEvent::ModelsFetched(result) => write!(f, "ModelsFetched(ok={})", result.is_ok()),
            SessionEvent::VoicesFetched(result) => write!(f, "VoicesFetched(ok={})", result.is_ok()),
            SessionEvent::LlmsFetched(result) => write!(f, "LlmsFetched(ok={})", result.is_ok()),
            SessionEvent::SpeakersFetched { language, result } => {
                write!(f, "SpeakersFetched({language}, ok={})", result.is_ok())
            }
            SessionEvent::ModelLoaded {
                generation,
                key,
                result,
            } => write!(f, "ModelLoaded({key}#{generation}, ok={})", result.is_ok()),
            SessionEvent::VoicePushed(result) => write!(f, "VoicePushed(ok={})", result.is_ok()),
            SessionEvent::LlmPushed(result) => write!(f, "LlmPushed(ok={})", result.is_ok()),
        }
    }
}

/// Work the session asks its runtime to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a message on the backend connection
    Send(ClientMessage),
    FetchModels,
    FetchVoices,
    FetchLlms,
    /// Re-fetch the voice catalog after a language change
    FetchSpeakers { language: String },
    /// Load a model; the result comes back tagged with `generation`
    LoadModel {
        generation: u64,
        key: String,
        url: String,
    },
    PushVoice { language: String, speaker: String },
    PushLlm { model: String },
}
