//! Information buffer: status and error messages for the user.
//!
//! One message log with two views. The roster view fills tab 0; the strip
//! view is the small area above the input line on every other tab. The strip
//! grows to show an important message and shrinks back on a timer.

use crate::model::message::NewMessage;
use crate::state::message_log::{MessageLog, ViewId};
use crate::view::text_window::TextWindow;

/// Maximum height the strip grows to when a message pops up.
pub const MAX_POPUP_HEIGHT: u16 = 10;

/// Information log with its roster and strip views.
#[derive(Debug)]
pub struct InfoBuffer {
    log: MessageLog<TextWindow>,
    roster_view: ViewId,
    strip_view: ViewId,
    base_height: u16,
    height: u16,
}

impl InfoBuffer {
    /// Buffer keeping `limit` messages with a strip `base_height` rows tall.
    pub fn new(limit: usize, base_height: u16) -> Self {
        let mut log = MessageLog::new(limit);
        let roster_view = log.add_window(TextWindow::for_info());
        let mut strip = TextWindow::for_info();
        strip.resize(strip.width(), base_height);
        let strip_view = log.add_window(strip);
        Self {
            log,
            roster_view,
            strip_view,
            base_height,
            height: base_height,
        }
    }

    /// Add a message tagged with `kind` (shown as its nickname).
    ///
    /// Returns the number of lines it took in the roster view.
    pub fn add(&mut self, kind: &str, text: &str) -> usize {
        self.log.append(NewMessage::new(text).nickname(kind))
    }

    /// The messages.
    pub fn log(&self) -> &MessageLog<TextWindow> {
        &self.log
    }

    /// View filling tab 0.
    pub fn roster_window(&self) -> Option<&TextWindow> {
        self.log.view(self.roster_view)
    }

    /// View filling tab 0, mutably.
    pub fn roster_window_mut(&mut self) -> Option<&mut TextWindow> {
        self.log.view_mut(self.roster_view)
    }

    /// Strip view above the input line.
    pub fn strip_window(&self) -> Option<&TextWindow> {
        self.log.view(self.strip_view)
    }

    /// Strip view, mutably.
    pub fn strip_window_mut(&mut self) -> Option<&mut TextWindow> {
        self.log.view_mut(self.strip_view)
    }

    /// Show times on messages added from now on.
    pub fn set_show_timestamps(&mut self, show: bool) {
        self.log.set_show_timestamps(show);
    }

    /// Current height of the strip.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Configured strip height.
    pub fn base_height(&self) -> u16 {
        self.base_height
    }

    /// Whether the strip is taller than configured.
    pub fn is_popped_up(&self) -> bool {
        self.height > self.base_height
    }

    /// Grow the strip so the last `lines` rows are visible.
    pub fn pop_up(&mut self, lines: usize) {
        // a base height above the cap wins
        let wanted = u16::try_from(lines)
            .unwrap_or(MAX_POPUP_HEIGHT)
            .min(MAX_POPUP_HEIGHT)
            .max(self.base_height);
        self.set_strip_height(wanted);
    }

    /// Return the strip to its configured height.
    pub fn shrink(&mut self) {
        self.set_strip_height(self.base_height);
    }

    /// Rewrap both views for a new terminal width and roster height.
    pub fn resize(&mut self, width: u16, roster_height: u16) {
        let height = self.height;
        if let Some(view) = self.log.view_mut(self.roster_view) {
            view.resize(width, roster_height);
        }
        self.log.rebuild_view(self.roster_view);
        if let Some(view) = self.log.view_mut(self.strip_view) {
            view.resize(width, height);
        }
        self.log.rebuild_view(self.strip_view);
    }

    fn set_strip_height(&mut self, height: u16) {
        self.height = height;
        if let Some(view) = self.log.view_mut(self.strip_view) {
            let width = view.width();
            view.resize(width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_reach_both_views() {
        let mut info = InfoBuffer::new(100, 2);
        info.add("Info", "hello");
        assert_eq!(info.roster_window().map(|w| w.lines().len()), Some(1));
        assert_eq!(info.strip_window().map(|w| w.lines().len()), Some(1));
    }

    #[test]
    fn pop_up_is_clamped_and_shrink_restores() {
        let mut info = InfoBuffer::new(100, 2);
        info.pop_up(1);
        assert_eq!(info.height(), 2);
        info.pop_up(50);
        assert_eq!(info.height(), MAX_POPUP_HEIGHT);
        assert!(info.is_popped_up());
        info.shrink();
        assert_eq!(info.height(), 2);
        assert_eq!(info.strip_window().map(TextWindow::height), Some(2));
    }

    #[test]
    fn pop_up_with_tall_base_keeps_base_height() {
        let mut info = InfoBuffer::new(100, MAX_POPUP_HEIGHT + 2);
        info.pop_up(1);
        assert_eq!(info.height(), MAX_POPUP_HEIGHT + 2);
        assert!(!info.is_popped_up());
    }
}
