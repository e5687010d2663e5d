//! Permanent tab 0: the information log and the command prompt.

use super::{RenderContext, Scroll, Tab, TabKind, TabMeta};
use crate::state::info_buffer::InfoBuffer;
use crate::state::input_line::InputLine;
use ratatui::layout::Rect;
use ratatui::Frame;

/// Name of tab 0.
pub const ROSTER_TAB_NAME: &str = "Roster";

/// The permanent tab 0. Draws the information buffer full size.
#[derive(Debug, Default)]
pub struct RosterInfoTab {
    meta: TabMeta,
    input: InputLine,
}

impl RosterInfoTab {
    /// The roster tab with an empty input line.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tab for RosterInfoTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TabMeta {
        &mut self.meta
    }

    fn kind(&self) -> TabKind {
        TabKind::RosterInfo
    }

    fn name(&self) -> &str {
        ROSTER_TAB_NAME
    }

    fn input(&self) -> Option<&InputLine> {
        Some(&self.input)
    }

    fn input_mut(&mut self) -> Option<&mut InputLine> {
        Some(&mut self.input)
    }

    fn matching_names(&self) -> Vec<(u8, String)> {
        vec![(1, "roster".to_string()), (2, "info".to_string())]
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: RenderContext<'_>) {
        if let Some(window) = ctx.info.roster_window() {
            window.render(frame, area, ctx.styles);
        }
    }

    fn scroll(&mut self, info: &mut InfoBuffer, scroll: Scroll) {
        if let Some(window) = info.roster_window_mut() {
            window.apply_scroll(scroll);
        }
    }
}
