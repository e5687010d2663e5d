//! Conversation tab: one message log, one window onto it, one input line.

use super::{RenderContext, Scroll, Tab, TabKind, TabMeta};
use crate::model::error::CorrectionError;
use crate::model::message::{AuthorIdentity, CorrelationId, Message, NewMessage};
use crate::state::info_buffer::InfoBuffer;
use crate::state::input_line::InputLine;
use crate::state::message_log::{MessageLog, ViewId};
use crate::view::text_window::TextWindow;
use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::Frame;
use tracing::debug;

/// Whether a conversation is a group room or a one-to-one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    /// A group chat.
    Room,
    /// A one-to-one chat.
    Direct,
}

/// A tab showing one conversation with its own log and input line.
#[derive(Debug)]
pub struct ConversationTab {
    meta: TabMeta,
    name: String,
    kind: ConversationKind,
    log: MessageLog<TextWindow>,
    view: Option<ViewId>,
    input: InputLine,
    last_sent: Option<CorrelationId>,
}

impl ConversationTab {
    /// Open a conversation keeping at most `limit` messages.
    pub fn new(name: impl Into<String>, kind: ConversationKind, limit: usize) -> Self {
        let mut log = MessageLog::new(limit);
        let view = log.add_window(TextWindow::new());
        Self {
            meta: TabMeta::default(),
            name: name.into(),
            kind,
            log,
            view: Some(view),
            input: InputLine::new(),
            last_sent: None,
        }
    }

    /// Room or direct chat.
    pub fn conversation_kind(&self) -> ConversationKind {
        self.kind
    }

    /// The conversation's messages.
    pub fn log(&self) -> &MessageLog<TextWindow> {
        &self.log
    }

    /// The window the tab draws.
    pub fn window(&self) -> Option<&TextWindow> {
        self.view.and_then(|id| self.log.view(id))
    }

    /// Toggle timestamps and rewrap every kept message.
    pub fn set_show_timestamps(&mut self, show: bool) {
        self.log.set_show_timestamps(show);
        self.rebuild();
    }

    /// Append a message; returns the lines it took.
    pub fn add_message(&mut self, message: NewMessage) -> usize {
        self.log.append(message)
    }

    /// Replace an earlier message by a corrected revision.
    pub fn correct(
        &mut self,
        text: &str,
        old_id: &CorrelationId,
        new_id: CorrelationId,
        author: Option<&AuthorIdentity>,
        timestamp: Option<DateTime<Local>>,
        highlighted: bool,
    ) -> Result<&Message, CorrectionError> {
        self.log
            .correct(text, old_id, new_id, author, timestamp, highlighted)
    }

    /// Remember the id of the last message we sent, for `/correct`.
    pub fn record_sent(&mut self, id: CorrelationId) {
        self.last_sent = Some(id);
    }

    /// Id of our last sent message.
    pub fn last_sent(&self) -> Option<&CorrelationId> {
        self.last_sent.as_ref()
    }

    fn rebuild(&mut self) {
        if let Some(id) = self.view {
            self.log.rebuild_view(id);
        }
    }
}

impl Tab for ConversationTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TabMeta {
        &mut self.meta
    }

    fn kind(&self) -> TabKind {
        TabKind::Conversation
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_close(&mut self) {
        if let Some(id) = self.view.take() {
            self.log.del_window(id);
        }
        debug!(name = %self.name, "Conversation tab closed");
    }

    fn input(&self) -> Option<&InputLine> {
        Some(&self.input)
    }

    fn input_mut(&mut self) -> Option<&mut InputLine> {
        Some(&mut self.input)
    }

    /// Full name, then the part before `@` for addresses like `room@host`.
    fn matching_names(&self) -> Vec<(u8, String)> {
        let mut names = vec![(2, self.name.clone())];
        if let Some((local, _)) = self.name.split_once('@') {
            names.push((1, local.to_string()));
        }
        names
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: RenderContext<'_>) {
        if let Some(window) = self.window() {
            window.render(frame, area, ctx.styles);
        }
    }

    fn scroll(&mut self, _info: &mut InfoBuffer, scroll: Scroll) {
        if let Some(window) = self.view.and_then(|id| self.log.view_mut(id)) {
            window.apply_scroll(scroll);
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        if let Some(window) = self.view.and_then(|id| self.log.view_mut(id)) {
            window.resize(width, height);
        }
        self.rebuild();
    }

    fn as_conversation(&self) -> Option<&ConversationTab> {
        Some(self)
    }

    fn as_conversation_mut(&mut self) -> Option<&mut ConversationTab> {
        Some(self)
    }
}
