//! Speech clip playback.
//!
//! Clips arrive asynchronously and out of step with the text channel, but must
//! play one at a time in arrival order. Each clip's resource is created as soon
//! as it arrives and reclaimed exactly once, after its terminal event.
//!
//! # Outputs
//!
//! - [`CommandOutput`] - spawns an external player per clip
//! - [`ClockOutput`] - silent, ends each clip after its WAV duration

mod clock;
mod command;
mod output;
mod queue;

pub use clock::ClockOutput;
pub use command::CommandOutput;
pub use output::{
    AudioItem, AudioOutput, BoxedAudioOutput, ClipId, PlaybackError, PlaybackEvent,
    PlaybackNotifier, PlaybackOutcome, PlaybackResult, wav_duration,
};
pub use queue::AudioQueue;

#[cfg(test)]
pub(crate) use output::test_support;
