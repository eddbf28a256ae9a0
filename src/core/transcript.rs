//! Chat transcript and the streamed-reply accumulator.
//!
//! The streamed buffer is a two-state machine:
//!
//! ```text
//!            text (new entry)            text (append)
//!   CLOSED ───────────────────▶ OPEN ◀─────────────┐
//!     ▲                          │  └──────────────┘
//!     └────────── done ──────────┘
//! ```
//!
//! `done` while CLOSED does nothing; a fragment while CLOSED opens a fresh
//! entry. Fragments are joined without a delimiter.

use std::fmt;

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
}

/// State of the streamed bot reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamBuffer {
    /// No reply is being streamed
    #[default]
    Closed,
    /// Fragments are appended to the entry at this transcript index
    Open { entry: usize },
}

/// What a call to [`Transcript::push_fragment`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// A new entry was created at this index
    Opened(usize),
    /// The fragment was appended to the entry at this index
    Appended(usize),
}

/// Ordered chat history, the typing indicator and the streamed buffer.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
    stream: StreamBuffer,
    typing: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stream(&self) -> StreamBuffer {
        self.stream
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Set the typing indicator; returns true when it changed.
    pub fn set_typing(&mut self, typing: bool) -> bool {
        let changed = self.typing != typing;
        self.typing = typing;
        changed
    }

    /// Append a finished entry and return its index.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> usize {
        self.entries.push(ChatEntry {
            role,
            text: text.into(),
        });
        self.entries.len() - 1
    }

    /// Route a streamed fragment: open a new bot entry or extend the open one.
    pub fn push_fragment(&mut self, fragment: &str) -> FragmentOutcome {
        match self.stream {
            StreamBuffer::Open { entry } => {
                self.entries[entry].text.push_str(fragment);
                FragmentOutcome::Appended(entry)
            }
            StreamBuffer::Closed => {
                let entry = self.push(Role::Bot, fragment);
                self.stream = StreamBuffer::Open { entry };
                FragmentOutcome::Opened(entry)
            }
        }
    }

    /// Close the streamed buffer. Returns the index of the entry that was
    /// open, or `None` when the buffer was already closed.
    pub fn finish_stream(&mut self) -> Option<usize> {
        match std::mem::take(&mut self.stream) {
            StreamBuffer::Open { entry } => Some(entry),
            StreamBuffer::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_accumulate_until_done() {
        let mut transcript = Transcript::new();

        assert_eq!(transcript.push_fragment("Hel"), FragmentOutcome::Opened(0));
        assert_eq!(transcript.push_fragment("lo"), FragmentOutcome::Appended(0));
        assert_eq!(transcript.finish_stream(), Some(0));

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.entries()[0].text, "Hello");
        assert_eq!(transcript.entries()[0].role, Role::Bot);
        assert_eq!(transcript.stream(), StreamBuffer::Closed);
    }

    #[test]
    fn test_done_while_closed_is_noop() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.finish_stream(), None);
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_fragment_after_done_opens_new_entry() {
        let mut transcript = Transcript::new();
        transcript.push_fragment("first");
        transcript.finish_stream();

        assert_eq!(transcript.push_fragment("second"), FragmentOutcome::Opened(1));
        assert_eq!(transcript.entries()[0].text, "first");
        assert_eq!(transcript.entries()[1].text, "second");
    }

    #[test]
    fn test_finished_entries_interleave_with_open_stream() {
        let mut transcript = Transcript::new();
        transcript.push_fragment("Str");
        transcript.push(Role::Bot, "complete message");
        transcript.push_fragment("eam");

        assert_eq!(transcript.entries()[0].text, "Stream");
        assert_eq!(transcript.entries()[1].text, "complete message");
    }

    #[test]
    fn test_typing_indicator_change_detection() {
        let mut transcript = Transcript::new();
        assert!(transcript.set_typing(true));
        assert!(!transcript.set_typing(true));
        assert!(transcript.set_typing(false));
        assert!(!transcript.is_typing());
    }
}
