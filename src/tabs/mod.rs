//! Tab variants and the capability interface they share.
//!
//! The set of variants is closed: [`GapTab`] (placeholder keeping numbers
//! stable), [`RosterInfoTab`] (permanent tab 0) and [`ConversationTab`].
//! Tabs never hold a reference back into the tab list; they are told their
//! number whenever the list is renumbered.

pub mod conversation;
pub mod gap;
pub mod roster;

pub use conversation::{ConversationKind, ConversationTab};
pub use gap::GapTab;
pub use roster::RosterInfoTab;

use crate::state::info_buffer::InfoBuffer;
use crate::state::input_line::{InputLine, InputOutcome};
use crate::view::styles::ChatStyles;
use ratatui::layout::Rect;
use ratatui::Frame;

/// Variant tag of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabKind {
    /// Placeholder left by a closed tab.
    Gap,
    /// A room or direct chat.
    Conversation,
    /// The permanent tab 0.
    RosterInfo,
    /// Any other tab.
    Other,
}

/// Attention state of a tab, used to find the next tab needing attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusState {
    /// The focused tab.
    Current,
    /// New messages arrived.
    Active,
    /// A direct conversation was opened by someone else.
    Private,
    /// Someone mentioned our nick.
    Highlight,
    /// Nothing new.
    #[default]
    None,
}

impl FocusState {
    /// Rank used by "jump to important tab"; negative ranks are never jumped to.
    pub fn priority(self) -> i32 {
        match self {
            FocusState::Highlight => 3,
            FocusState::Private => 2,
            FocusState::Active => 1,
            FocusState::Current | FocusState::None => -1,
        }
    }

    /// Raise to `other` if it ranks higher; attention is never downgraded
    /// by a less important event.
    pub fn upgrade(self, other: FocusState) -> FocusState {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

/// Scroll requests routed to the focused tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// One line towards older messages.
    LineUp,
    /// One line towards newer messages.
    LineDown,
    /// Half a page up.
    HalfUp,
    /// Half a page down.
    HalfDown,
    /// A full page up.
    PageUp,
    /// A full page down.
    PageDown,
}

/// Shared state a tab may read while drawing itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// The information buffer.
    pub info: &'a InfoBuffer,
    /// Active styles.
    pub styles: &'a ChatStyles,
}

/// Bookkeeping every tab carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabMeta {
    /// Position in the tab list.
    pub number: usize,
    /// Focus and attention state.
    pub state: FocusState,
}

/// Capability interface of a tab.
pub trait Tab {
    /// Shared bookkeeping.
    fn meta(&self) -> &TabMeta;

    /// Shared bookkeeping, mutably.
    fn meta_mut(&mut self) -> &mut TabMeta;

    /// Variant tag.
    fn kind(&self) -> TabKind;

    /// Name shown in the tab bar and matched by `/win`.
    fn name(&self) -> &str;

    /// True for gaps: a slot holding no content.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Position in the tab list.
    fn number(&self) -> usize {
        self.meta().number
    }

    /// Called by the tab list after renumbering.
    fn set_number(&mut self, number: usize) {
        self.meta_mut().number = number;
    }

    /// Current focus state.
    fn focus_state(&self) -> FocusState {
        self.meta().state
    }

    /// Set the focus state.
    fn set_focus_state(&mut self, state: FocusState) {
        self.meta_mut().state = state;
    }

    /// The tab became the focused one.
    fn on_gain_focus(&mut self) {
        self.set_focus_state(FocusState::Current);
    }

    /// The tab stopped being focused.
    fn on_lose_focus(&mut self) {
        self.set_focus_state(FocusState::None);
    }

    /// The tab is being removed from the list.
    fn on_close(&mut self) {}

    /// Feed a key (or a raw block of text) to the tab's input line.
    fn on_input(&mut self, key: &str, raw: bool) -> InputOutcome {
        match self.input_mut() {
            Some(input) => input.do_command(key, raw),
            None => InputOutcome::Edited,
        }
    }

    /// The tab's input line, if it has one.
    fn input(&self) -> Option<&InputLine> {
        None
    }

    /// The tab's input line, mutably.
    fn input_mut(&mut self) -> Option<&mut InputLine> {
        None
    }

    /// Names `/win` matches against, lower rank preferred.
    fn matching_names(&self) -> Vec<(u8, String)> {
        vec![(1, self.name().to_string())]
    }

    /// Draw the tab into `area`.
    fn render(&self, frame: &mut Frame, area: Rect, ctx: RenderContext<'_>);

    /// Scroll the tab's window.
    fn scroll(&mut self, _info: &mut InfoBuffer, _scroll: Scroll) {}

    /// The tab's area changed size.
    fn resize(&mut self, _width: u16, _height: u16) {}

    /// Downcast to a conversation.
    fn as_conversation(&self) -> Option<&ConversationTab> {
        None
    }

    /// Downcast to a conversation, mutably.
    fn as_conversation_mut(&mut self) -> Option<&mut ConversationTab> {
        None
    }
}
