//! Line-oriented terminal front-end.
//!
//! [`TerminalView`] prints the transcript as it changes, streaming bot
//! replies onto one line as fragments arrive. [`parse_input`] turns a typed
//! line into user input: plain text is a chat message, a leading `/` starts a
//! command.

use std::io::{self, BufRead, Write};
use std::thread;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::UserInput;
use crate::core::avatar::Viewport;
use crate::core::catalog::ModelEntry;
use crate::core::expression::{ExpressionControl, ExpressionPanel, NO_EXPRESSIONS_LABEL};
use crate::core::selectors::{Selector, SelectorKind};
use crate::core::session::{ChatView, SessionEvent, SessionStatus};
use crate::core::transcript::{ChatEntry, Role};

pub const HELP: &str = "\
Commands:
  /model KEY       switch avatar model
  /lang CODE       choose voice language
  /speaker NAME    choose voice speaker
  /llm ID          choose language model
  /expr NAME       apply an expression
  /resize W H      resize the canvas
  /status          show session status
  /quit            leave
Anything else is sent as a chat message.";

// =============================================================================
// Input
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown command /{0}")]
    UnknownCommand(String),

    #[error("/{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid size '{0}', expected positive width and height")]
    InvalidSize(String),
}

/// Parse one typed line. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Result<Option<UserInput>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(command_line) = line.strip_prefix('/') else {
        return Ok(Some(SessionEvent::UserSubmit(line.to_string()).into()));
    };

    let (command, rest) = command_line
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((command_line, ""));

    let argument = |command: &'static str, expected: &'static str| {
        if rest.is_empty() {
            Err(InputError::MissingArgument { command, expected })
        } else {
            Ok(rest.to_string())
        }
    };

    let input: UserInput = match command {
        "model" => SessionEvent::SelectModel(argument("model", "a model key")?).into(),
        "lang" => SessionEvent::SelectLanguage(argument("lang", "a language code")?).into(),
        "speaker" => SessionEvent::SelectSpeaker(argument("speaker", "a speaker name")?).into(),
        "llm" => SessionEvent::SelectLlm(argument("llm", "a model id")?).into(),
        "expr" => SessionEvent::ClickExpression(argument("expr", "an expression name")?).into(),
        "resize" => SessionEvent::Resize(parse_size(rest)?).into(),
        "status" => UserInput::Status,
        "quit" | "exit" => UserInput::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    Ok(Some(input))
}

/// Read typed lines on a dedicated thread and forward the parsed input.
///
/// The thread ends at end of input, after `/quit`, or once the receiver is
/// gone. A blocked read never holds up runtime shutdown.
pub fn spawn_input_reader<R>(
    reader: R,
    input: mpsc::UnboundedSender<UserInput>,
) -> io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("virtu-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("Failed to read input: {e}");
                        break;
                    }
                };

                match parse_input(&line) {
                    Ok(Some(parsed)) => {
                        let quit = matches!(parsed, UserInput::Quit);
                        if input.send(parsed).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}\n{HELP}"),
                }
            }
        })
}

fn parse_size(raw: &str) -> Result<Viewport, InputError> {
    let invalid = || InputError::InvalidSize(raw.to_string());

    let mut parts = raw.split(|c: char| c.is_whitespace() || c == 'x').filter(|p| !p.is_empty());
    let (Some(width), Some(height), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let width: f32 = width.parse().map_err(|_| invalid())?;
    let height: f32 = height.parse().map_err(|_| invalid())?;
    if !(width > 0.0 && height > 0.0) {
        return Err(invalid());
    }
    Ok(Viewport::new(width, height))
}

// =============================================================================
// View
// =============================================================================

/// Prints session changes to a writer, stdout by default.
pub struct TerminalView<W: Write + Send = io::Stdout> {
    out: W,
    /// Transcript index of the bot line still being written
    open_line: Option<usize>,
    last_values: [Option<String>; 4],
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            open_line: None,
            last_values: Default::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_line(&mut self) {
        if self.open_line.take().is_some() {
            self.write("\n");
        }
    }

    fn line(&mut self, text: &str) {
        self.end_line();
        self.write(text);
        self.write("\n");
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::debug!("Terminal write failed: {e}");
        }
    }
}

fn slot(kind: SelectorKind) -> usize {
    match kind {
        SelectorKind::Model => 0,
        SelectorKind::Language => 1,
        SelectorKind::Speaker => 2,
        SelectorKind::Llm => 3,
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn entry_added(&mut self, index: usize, entry: &ChatEntry) {
        self.end_line();
        match entry.role {
            Role::User => self.line(&format!("you> {}", entry.text)),
            Role::Bot => {
                // left open: fragments may follow
                self.write(&format!("bot> {}", entry.text));
                self.open_line = Some(index);
            }
        }
    }

    fn entry_extended(&mut self, index: usize, fragment: &str) {
        if self.open_line == Some(index) {
            self.write(fragment);
        } else {
            self.end_line();
            self.write(&format!("bot> ...{fragment}"));
            self.open_line = Some(index);
        }
    }

    fn stream_closed(&mut self, _index: usize) {
        self.end_line();
    }

    fn typing_changed(&mut self, typing: bool) {
        if typing {
            self.line("  (bot is typing...)");
        }
    }

    fn panel_changed(&mut self, panel: &ExpressionPanel) {
        if panel.is_empty() {
            self.line(&format!("[{NO_EXPRESSIONS_LABEL}]"));
            return;
        }
        let labels: Vec<&str> = panel.controls().iter().map(|c| c.label.as_str()).collect();
        self.line(&format!("[expressions: {}]", labels.join(", ")));
    }

    fn active_expression_changed(&mut self, control: Option<&ExpressionControl>) {
        if let Some(control) = control {
            self.line(&format!("[expression: {}]", control.label));
        }
    }

    fn selector_changed(&mut self, kind: SelectorKind, selector: &Selector) {
        let value = selector.value().map(str::to_string);
        let last = &mut self.last_values[slot(kind)];
        if *last == value {
            return;
        }
        *last = value.clone();
        if let Some(value) = value {
            self.line(&format!("[{kind}: {value}]"));
        }
    }

    fn model_ready(&mut self, key: &str, entry: &ModelEntry) {
        self.line(&format!("[avatar {} ({key}) ready]", entry.name));
    }

    fn disconnected(&mut self, reason: Option<&str>) {
        match reason {
            Some(reason) => self.line(&format!("[disconnected: {reason}]")),
            None => self.line("[disconnected]"),
        }
    }

    fn status(&mut self, status: &SessionStatus) {
        self.line(&format!("[status] {status}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(input: Option<UserInput>) -> String {
        match input {
            Some(UserInput::Event(SessionEvent::UserSubmit(text))) => text,
            other => panic!("expected chat text, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(submitted(parse_input("  hello there ").unwrap()), "hello there");
        assert!(parse_input("   ").unwrap().is_none());
    }

    #[test]
    fn test_commands() {
        assert!(matches!(
            parse_input("/model hiyori").unwrap(),
            Some(UserInput::Event(SessionEvent::SelectModel(key))) if key == "hiyori"
        ));
        assert!(matches!(
            parse_input("/lang ja").unwrap(),
            Some(UserInput::Event(SessionEvent::SelectLanguage(code))) if code == "ja"
        ));
        assert!(matches!(
            parse_input("/speaker Jenny Neural").unwrap(),
            Some(UserInput::Event(SessionEvent::SelectSpeaker(name))) if name == "Jenny Neural"
        ));
        assert!(matches!(
            parse_input("/expr happy").unwrap(),
            Some(UserInput::Event(SessionEvent::ClickExpression(name))) if name == "happy"
        ));
        assert!(matches!(parse_input("/status").unwrap(), Some(UserInput::Status)));
        assert!(matches!(parse_input("/quit").unwrap(), Some(UserInput::Quit)));
    }

    #[test]
    fn test_resize() {
        let Some(UserInput::Event(SessionEvent::Resize(viewport))) =
            parse_input("/resize 390 844").unwrap()
        else {
            panic!("expected resize");
        };
        assert_eq!(viewport, Viewport::new(390.0, 844.0));

        assert!(parse_input("/resize 1920x1080").is_ok());
        assert_eq!(
            parse_input("/resize 0 10").unwrap_err(),
            InputError::InvalidSize("0 10".to_string())
        );
        assert!(parse_input("/resize 10").is_err());
    }

    #[test]
    fn test_command_errors() {
        assert_eq!(
            parse_input("/dance").unwrap_err(),
            InputError::UnknownCommand("dance".to_string())
        );
        assert_eq!(
            parse_input("/model").unwrap_err().to_string(),
            "/model needs a model key"
        );
    }

    /// Reader that blocks until released, like an idle terminal.
    struct HeldOpen(std::sync::mpsc::Receiver<Vec<u8>>);

    impl io::Read for HeldOpen {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.recv() {
                Ok(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Err(_) => Ok(0),
            }
        }
    }

    #[test]
    fn test_input_reader_forwards_until_quit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let typed = io::Cursor::new("hello\n\n/dance\n/quit\nnever sent\n");

        spawn_input_reader(typed, tx).unwrap().join().unwrap();

        assert_eq!(submitted(Some(rx.try_recv().unwrap())), "hello");
        assert!(matches!(rx.try_recv().unwrap(), UserInput::Quit));
        // sender dropped with the thread
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_idle_input_does_not_block_runtime_shutdown() {
        let (release, held) = std::sync::mpsc::channel::<Vec<u8>>();
        let (tx, _rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let reader = runtime
            .block_on(async { spawn_input_reader(io::BufReader::new(HeldOpen(held)), tx) })
            .unwrap();

        let started = std::time::Instant::now();
        drop(runtime);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        drop(release);
        reader.join().unwrap();
    }

    fn bot(text: &str) -> ChatEntry {
        ChatEntry {
            role: Role::Bot,
            text: text.to_string(),
        }
    }

    fn printed(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_streamed_reply_on_one_line() {
        let mut view = TerminalView::new(Vec::new());

        view.entry_added(0, &bot("Hel"));
        view.entry_extended(0, "lo");
        view.entry_extended(0, "!");
        view.stream_closed(0);
        view.entry_added(
            1,
            &ChatEntry {
                role: Role::User,
                text: "hi".to_string(),
            },
        );

        assert_eq!(printed(view), "bot> Hello!\nyou> hi\n");
    }

    #[test]
    fn test_complete_message_then_notice() {
        let mut view = TerminalView::new(Vec::new());

        view.entry_added(0, &bot("Hi there"));
        view.disconnected(Some("reset"));

        assert_eq!(printed(view), "bot> Hi there\n[disconnected: reset]\n");
    }

    #[test]
    fn test_selector_printed_only_on_change() {
        let mut view = TerminalView::new(Vec::new());
        let mut selector = Selector::default();
        selector.set_options(vec![crate::core::selectors::SelectorOption::plain("llama3")]);
        selector.select("llama3");

        view.selector_changed(SelectorKind::Llm, &selector);
        selector.set_disabled(true);
        view.selector_changed(SelectorKind::Llm, &selector);

        assert_eq!(printed(view), "[llm: llama3]\n");
    }

    #[test]
    fn test_empty_panel_placeholder() {
        let mut view = TerminalView::new(Vec::new());
        view.panel_changed(&ExpressionPanel::empty());
        assert_eq!(printed(view), "[No expressions available]\n");
    }
}
