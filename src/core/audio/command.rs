use std::io::Write;

use bytes::Bytes;
use tokio::process::Command;

use super::output::{
    AudioItem, AudioOutput, ClipId, PlaybackError, PlaybackEvent, PlaybackNotifier,
    PlaybackResult, notify_after, wav_duration,
};

/// Output that hands each clip to an external player (`aplay`, `afplay`,
/// `ffplay -nodisp -autoexit`, ...).
///
/// Every clip is written to a temporary `.wav` file when it arrives; the file
/// is passed as the last argument to the player and removed when the item is
/// released. Muted clips are timed from the WAV header instead of spawned.
pub struct CommandOutput {
    program: String,
    args: Vec<String>,
    notifier: PlaybackNotifier,
}

impl CommandOutput {
    pub fn new(program: impl Into<String>, args: Vec<String>, notifier: PlaybackNotifier) -> Self {
        Self {
            program: program.into(),
            args,
            notifier,
        }
    }
}

impl AudioOutput for CommandOutput {
    fn create(&mut self, id: ClipId, data: Bytes) -> PlaybackResult<AudioItem> {
        let mut file = tempfile::Builder::new()
            .prefix("virtu-clip-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| PlaybackError::Resource(e.to_string()))?;
        file.write_all(&data)
            .map_err(|e| PlaybackError::Resource(e.to_string()))?;
        Ok(AudioItem::with_file(id, data, file.into_temp_path()))
    }

    fn play(&mut self, item: &AudioItem, muted: bool) -> PlaybackResult<()> {
        if muted {
            let duration = wav_duration(item.data())?;
            notify_after(&self.notifier, duration, PlaybackEvent::ended(item.id()));
            return Ok(());
        }

        let path = item
            .path()
            .ok_or_else(|| PlaybackError::Start(format!("{} has no backing file", item.id())))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::Start(format!("{}: {e}", self.program)))?;

        tracing::debug!("Playing {} with {}", item.id(), self.program);

        let clip = item.id();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let event = match child.wait().await {
                Ok(status) if status.success() => PlaybackEvent::ended(clip),
                Ok(status) => PlaybackEvent::errored(clip, format!("player exited with {status}")),
                Err(e) => PlaybackEvent::errored(clip, e.to_string()),
            };
            if notifier.send(event).is_err() {
                tracing::debug!("Playback listener gone before terminal event");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::output::test_support::silent_wav;
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_create_writes_backing_file_and_release_removes_it() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut output = CommandOutput::new("true", Vec::new(), tx);

        let item = output
            .create(ClipId(1), Bytes::from_static(b"payload"))
            .unwrap();
        let path = item.path().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");

        output.release(item);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_start_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut output = CommandOutput::new("/nonexistent/virtu-player", Vec::new(), tx);

        let item = output
            .create(ClipId(2), Bytes::from(silent_wav(8000, 8)))
            .unwrap();
        let result = output.play(&item, false);
        assert!(matches!(result, Err(PlaybackError::Start(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_player_exit_status_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut ok = CommandOutput::new("true", Vec::new(), tx.clone());
        let item = ok.create(ClipId(3), Bytes::from_static(b"a")).unwrap();
        ok.play(&item, false).unwrap();
        assert_eq!(rx.recv().await, Some(PlaybackEvent::ended(ClipId(3))));

        let mut failing = CommandOutput::new("false", Vec::new(), tx);
        let item = failing.create(ClipId(4), Bytes::from_static(b"b")).unwrap();
        failing.play(&item, false).unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.clip, ClipId(4));
        assert!(matches!(event.outcome, super::super::PlaybackOutcome::Errored(_)));
    }

    #[tokio::test]
    async fn test_muted_clip_is_timed_not_spawned() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut output = CommandOutput::new("/nonexistent/virtu-player", Vec::new(), tx);

        let item = output
            .create(ClipId(5), Bytes::from(silent_wav(8000, 80)))
            .unwrap();
        output.play(&item, true).unwrap();
        assert_eq!(rx.recv().await, Some(PlaybackEvent::ended(ClipId(5))));
    }
}
