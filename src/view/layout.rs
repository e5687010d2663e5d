//! Screen layout.
//!
//! From top to bottom: the focused tab, the information strip (hidden on
//! tab 0, which shows the information log full-size), the tab bar and the
//! input line.

use crate::state::core::Core;
use crate::tabs::{RenderContext, TabKind};
use crate::view::constants::{INPUT_HEIGHT, TAB_BAR_HEIGHT};
use crate::view::styles::ChatStyles;
use crate::view::tabs::render_tab_bar;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Areas of one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Focused tab.
    pub tab: Rect,
    /// Information strip, absent when the focused tab hides it.
    pub info: Option<Rect>,
    /// Tab bar.
    pub bar: Rect,
    /// Input line.
    pub input: Rect,
}

impl ScreenLayout {
    /// Split `area`. The strip gets `info_height` rows when shown.
    pub fn split(area: Rect, info_height: u16, show_strip: bool) -> Self {
        let strip = if show_strip { info_height } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(strip),
                Constraint::Length(TAB_BAR_HEIGHT),
                Constraint::Length(INPUT_HEIGHT),
            ])
            .split(area);
        Self {
            tab: chunks[0],
            info: show_strip.then_some(chunks[1]),
            bar: chunks[2],
            input: chunks[3],
        }
    }

    /// Layout of a `width` x `height` screen.
    pub fn compute(width: u16, height: u16, info_height: u16, show_strip: bool) -> Self {
        Self::split(Rect::new(0, 0, width, height), info_height, show_strip)
    }
}

/// Draw the whole screen for `core`.
pub fn render_screen(frame: &mut Frame, core: &Core, styles: &ChatStyles) {
    let current = core.tabs().current();
    let show_strip = current.kind() != TabKind::RosterInfo;
    let layout = ScreenLayout::split(frame.area(), core.info().height(), show_strip);

    let ctx = RenderContext {
        info: core.info(),
        styles,
    };
    current.render(frame, layout.tab, ctx);

    if let (Some(area), Some(window)) = (layout.info, core.info().strip_window()) {
        window.render(frame, area, styles);
    }
    render_tab_bar(frame, layout.bar, core.tabs(), styles);
    render_input(frame, layout.input, core);
}

/// Input line of the focused tab, or the paused prompt.
fn render_input(frame: &mut Frame, area: Rect, core: &Core) {
    let (prompt, input) = match core.paused_prompt() {
        Some(paused) => (paused.prompt(), Some(paused.input())),
        None => ("", core.tabs().current().input()),
    };
    let Some(input) = input else {
        return;
    };

    let text = input.text();
    let before_cursor: String = text.chars().take(input.cursor()).collect();
    let cursor_col = prompt.width() + before_cursor.width();
    let width = usize::from(area.width.max(1));
    // keep the cursor on screen by sliding the line left
    let skip = (cursor_col + 1).saturating_sub(width);

    let full = format!("{prompt}{text}");
    let mut shown = String::new();
    let mut col = 0;
    for c in full.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if col >= skip {
            shown.push(c);
        }
        col += w;
    }

    frame.render_widget(Paragraph::new(Line::from(Span::raw(shown))), area);
    let x = u16::try_from(cursor_col - skip).unwrap_or(area.width);
    frame.set_cursor_position(Position::new(area.x + x, area.y));
}
