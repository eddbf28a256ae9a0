use crate::core::catalog::ModelEntry;
use crate::core::expression::{ExpressionControl, ExpressionPanel};
use crate::core::selectors::{Selector, SelectorKind};
use crate::core::transcript::ChatEntry;

use super::SessionStatus;

/// Presentation of session state.
///
/// The session calls these as its state changes; every method defaults to
/// doing nothing so a view only implements what it shows.
pub trait ChatView: Send {
    /// A transcript entry was appended.
    fn entry_added(&mut self, _index: usize, _entry: &ChatEntry) {}

    /// The open streamed entry grew by `fragment`.
    fn entry_extended(&mut self, _index: usize, _fragment: &str) {}

    /// The streamed entry at `index` is complete.
    fn stream_closed(&mut self, _index: usize) {}

    fn typing_changed(&mut self, _typing: bool) {}

    fn panel_changed(&mut self, _panel: &ExpressionPanel) {}

    fn active_expression_changed(&mut self, _control: Option<&ExpressionControl>) {}

    fn selector_changed(&mut self, _kind: SelectorKind, _selector: &Selector) {}

    /// A model finished loading and is on screen.
    fn model_ready(&mut self, _key: &str, _entry: &ModelEntry) {}

    fn disconnected(&mut self, _reason: Option<&str>) {}

    /// A status summary was requested.
    fn status(&mut self, _status: &SessionStatus) {}
}

/// View that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ChatView for NullView {}
