//! Per-conversation message store with correction chains.
//!
//! A [`MessageLog`] is a bounded ring of [`Message`]s (oldest at front, newest
//! at back). A correction replaces the corrected message in its slot instead
//! of appending, so the visible order of a conversation never changes when
//! someone fixes a typo.
//!
//! Attached views are notified on every append and correction so each can
//! build lines for just the new message instead of repainting everything.

use crate::model::error::CorrectionError;
use crate::model::message::{AuthorIdentity, CorrelationId, Message, NewMessage};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use tracing::debug;

#[cfg(test)]
#[path = "message_log_tests.rs"]
mod tests;

/// Default number of messages kept per conversation.
pub const DEFAULT_MESSAGES_LIMIT: usize = 2048;

/// Render target attached to a [`MessageLog`].
pub trait MessageView {
    /// Build display lines for a newly appended message.
    ///
    /// Returns the number of lines produced.
    fn build_new_message(
        &mut self,
        message: &Message,
        history: bool,
        highlight: bool,
        show_timestamp: bool,
    ) -> usize;

    /// Rebuild the lines of the message identified by `old_id` from its
    /// replacement.
    fn modify_message(&mut self, old_id: &CorrelationId, message: &Message, show_timestamp: bool);

    /// Lines scrolled up from the bottom; 0 means following new content.
    fn scroll_offset(&self) -> usize;

    /// Scroll `lines` further away from the bottom.
    fn scroll_up(&mut self, lines: usize);

    /// Drop every line and build them again from `messages`, oldest first.
    fn rebuild<'a>(&mut self, messages: impl Iterator<Item = &'a Message>, show_timestamp: bool);
}

/// Handle returned by [`MessageLog::add_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

/// Bounded, ordered store of messages for one conversation.
#[derive(Debug)]
pub struct MessageLog<V> {
    messages: VecDeque<Message>,
    limit: usize,
    show_timestamps: bool,
    views: Vec<(ViewId, V)>,
    next_view: usize,
}

impl<V: MessageView> MessageLog<V> {
    /// Create an empty log keeping at most `limit` messages.
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit,
            show_timestamps: true,
            views: Vec::new(),
            next_view: 0,
        }
    }

    /// Timestamps apply to messages built from now on.
    pub fn set_show_timestamps(&mut self, show: bool) {
        self.show_timestamps = show;
    }

    /// Whether new lines carry a timestamp.
    pub fn show_timestamps(&self) -> bool {
        self.show_timestamps
    }

    /// Attach a render target. It only receives messages added from now on.
    pub fn add_window(&mut self, view: V) -> ViewId {
        let id = ViewId(self.next_view);
        self.next_view += 1;
        self.views.push((id, view));
        id
    }

    /// Detach a render target, handing it back to the caller.
    pub fn del_window(&mut self, id: ViewId) -> Option<V> {
        let pos = self.views.iter().position(|(vid, _)| *vid == id)?;
        Some(self.views.remove(pos).1)
    }

    /// Whether any render target is attached.
    pub fn has_windows(&self) -> bool {
        !self.views.is_empty()
    }

    /// The render target attached as `id`.
    pub fn view(&self, id: ViewId) -> Option<&V> {
        self.views.iter().find(|(vid, _)| *vid == id).map(|(_, v)| v)
    }

    /// Mutable access to the render target attached as `id`.
    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut V> {
        self.views
            .iter_mut()
            .find(|(vid, _)| *vid == id)
            .map(|(_, v)| v)
    }

    /// Append a message and notify every attached view.
    ///
    /// Evicts from the front while over the limit. Returns the number of
    /// lines the first view rendered (at least 1), so the caller can decide
    /// how far to scroll.
    pub fn append(&mut self, new: NewMessage) -> usize {
        let history = new.history;
        let highlight = new.highlighted;
        let message = Message::build(new);
        debug!(
            id = ?message.correlation_id(),
            action = message.is_action(),
            "Appending message"
        );
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }

        let Some(message) = self.messages.back() else {
            // limit of zero: nothing is kept, nothing to show
            return 1;
        };
        let mut first = None;
        for (_, view) in &mut self.views {
            let lines = view.build_new_message(message, history, highlight, self.show_timestamps);
            if first.is_none() {
                first = Some(lines);
            }
            if view.scroll_offset() != 0 {
                view.scroll_up(lines);
            }
        }
        first.filter(|&n| n > 0).unwrap_or(1)
    }

    /// Rebuild view `id` from the stored messages.
    pub fn rebuild_view(&mut self, id: ViewId) {
        let show = self.show_timestamps;
        let messages = &self.messages;
        if let Some((_, view)) = self.views.iter_mut().find(|(vid, _)| *vid == id) {
            view.rebuild(messages.iter(), show);
        }
    }

    /// Check that `author` may correct the message carrying `old_id`,
    /// without changing anything. Returns the index of that message.
    ///
    /// # Errors
    ///
    /// The same as [`MessageLog::correct`].
    pub fn correctable(
        &self,
        old_id: &CorrelationId,
        author: Option<&AuthorIdentity>,
    ) -> Result<usize, CorrectionError> {
        let Some(index) = self
            .messages
            .iter()
            .rposition(|m| m.correlation_id() == Some(old_id))
        else {
            debug!(%old_id, "Message not found, abort replacement");
            return Err(CorrectionError::NotFound(old_id.clone()));
        };

        let found = &self.messages[index];
        if let Some(owner) = found.author_identity() {
            if author != Some(owner) {
                return Err(CorrectionError::WrongAuthor(old_id.clone()));
            }
        }
        if found.display_time().is_long_form() {
            return Err(CorrectionError::DelayedMessage(old_id.clone()));
        }
        Ok(index)
    }

    /// Replace the most recent message carrying `old_id` with a new revision.
    ///
    /// The replacement keeps the slot of the original. On any error the log
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// - [`CorrectionError::NotFound`] when no message has `old_id`
    /// - [`CorrectionError::WrongAuthor`] when the message has an author
    ///   identity different from `author`
    /// - [`CorrectionError::DelayedMessage`] when the message was a history
    ///   replay
    pub fn correct(
        &mut self,
        text: &str,
        old_id: &CorrelationId,
        new_id: CorrelationId,
        author: Option<&AuthorIdentity>,
        timestamp: Option<DateTime<Local>>,
        highlighted: bool,
    ) -> Result<&Message, CorrectionError> {
        let index = self.correctable(old_id, author)?;
        let Some(previous) = self.messages.remove(index) else {
            return Err(CorrectionError::NotFound(old_id.clone()));
        };
        let revised = Message::revise(previous, text, new_id, timestamp, highlighted);
        debug!(%old_id, new_id = ?revised.correlation_id(), revision = revised.revision_count(), "Replacing message");
        self.messages.insert(index, revised);

        let message = &self.messages[index];
        for (_, view) in &mut self.views {
            view.modify_message(old_id, message, self.show_timestamps);
        }
        Ok(message)
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> std::collections::vec_deque::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Newest message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Most recent message carrying `id`.
    pub fn find(&self, id: &CorrelationId) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.correlation_id() == Some(id))
    }

    /// Number of kept messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message is kept.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of kept messages.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<V> Drop for MessageLog<V> {
    fn drop(&mut self) {
        debug!("Deleting {} messages from message log", self.messages.len());
    }
}
