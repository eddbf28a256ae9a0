use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempPath;
use thiserror::Error;
use tokio::sync::mpsc;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while preparing or starting a clip.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Payload could not be decoded as audio
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The backing resource could not be created
    #[error("Resource error: {0}")]
    Resource(String),

    /// Playback could not be started
    #[error("Playback start failed: {0}")]
    Start(String),
}

/// Result type for playback operations.
pub type PlaybackResult<T> = Result<T, PlaybackError>;

// =============================================================================
// Clips and Events
// =============================================================================

/// Sequential clip identifier, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip-{}", self.0)
    }
}

/// A playable clip and the resource backing it.
///
/// The resource lives as long as the item: dropping the item (through
/// [`AudioOutput::release`]) reclaims it.
#[derive(Debug)]
pub struct AudioItem {
    id: ClipId,
    data: Bytes,
    file: Option<TempPath>,
}

impl AudioItem {
    /// Item backed only by its in-memory payload.
    pub fn new(id: ClipId, data: Bytes) -> Self {
        Self {
            id,
            data,
            file: None,
        }
    }

    /// Item backed by a temporary file holding the payload.
    pub fn with_file(id: ClipId, data: Bytes, file: TempPath) -> Self {
        Self {
            id,
            data,
            file: Some(file),
        }
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Path of the backing file, when there is one.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// How a clip's playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Ended,
    Errored(String),
}

/// Terminal event for one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub clip: ClipId,
    pub outcome: PlaybackOutcome,
}

impl PlaybackEvent {
    pub fn ended(clip: ClipId) -> Self {
        Self {
            clip,
            outcome: PlaybackOutcome::Ended,
        }
    }

    pub fn errored(clip: ClipId, reason: impl Into<String>) -> Self {
        Self {
            clip,
            outcome: PlaybackOutcome::Errored(reason.into()),
        }
    }
}

/// Channel on which outputs report terminal events.
pub type PlaybackNotifier = mpsc::UnboundedSender<PlaybackEvent>;

// =============================================================================
// Output Trait
// =============================================================================

/// Local audio playback.
///
/// `play` only starts playback; the terminal event (ended or errored) is
/// reported later on the output's [`PlaybackNotifier`]. An `Err` from `play`
/// means nothing was started and no event will follow.
pub trait AudioOutput: Send {
    /// Wrap a payload as a playable item, creating its resource now.
    fn create(&mut self, id: ClipId, data: Bytes) -> PlaybackResult<AudioItem>;

    /// Start playing an item. Muted playback keeps timing but produces no sound.
    fn play(&mut self, item: &AudioItem, muted: bool) -> PlaybackResult<()>;

    /// Reclaim an item's resource after its terminal event.
    fn release(&mut self, item: AudioItem) {
        tracing::trace!("Releasing {}", item.id());
        drop(item);
    }
}

/// Boxed trait object for audio outputs.
pub type BoxedAudioOutput = Box<dyn AudioOutput>;

/// Read the playing time of a WAV payload from its header.
pub fn wav_duration(data: &[u8]) -> PlaybackResult<Duration> {
    let reader =
        hound::WavReader::new(Cursor::new(data)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(PlaybackError::Decode("zero sample rate".to_string()));
    }
    // duration() counts frames (samples per channel)
    let frames = reader.duration() as f64;
    Ok(Duration::from_secs_f64(frames / spec.sample_rate as f64))
}

/// Report `event` after `delay`.
pub(crate) fn notify_after(notifier: &PlaybackNotifier, delay: Duration, event: PlaybackEvent) {
    let notifier = notifier.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if notifier.send(event).is_err() {
            tracing::debug!("Playback listener gone before terminal event");
        }
    });
}
