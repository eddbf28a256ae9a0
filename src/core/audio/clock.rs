use bytes::Bytes;

use super::output::{
    AudioItem, AudioOutput, ClipId, PlaybackEvent, PlaybackNotifier, PlaybackResult,
    notify_after, wav_duration,
};

/// Output that produces no sound and ends each clip after its WAV duration.
///
/// Used when no player command is configured, and for muted playback while
/// the avatar engine voices the clip itself.
pub struct ClockOutput {
    notifier: PlaybackNotifier,
}

impl ClockOutput {
    pub fn new(notifier: PlaybackNotifier) -> Self {
        Self { notifier }
    }
}

impl AudioOutput for ClockOutput {
    fn create(&mut self, id: ClipId, data: Bytes) -> PlaybackResult<AudioItem> {
        Ok(AudioItem::new(id, data))
    }

    fn play(&mut self, item: &AudioItem, muted: bool) -> PlaybackResult<()> {
        let duration = wav_duration(item.data())?;
        tracing::debug!(
            "Timing {} for {:?}{}",
            item.id(),
            duration,
            if muted { " (muted)" } else { "" }
        );
        notify_after(&self.notifier, duration, PlaybackEvent::ended(item.id()));
        Ok(())
    }
}
