//! Placeholder tab.

use super::{RenderContext, Tab, TabKind, TabMeta};
use ratatui::layout::Rect;
use ratatui::Frame;

/// Empty slot kept in gap mode so other tabs keep their numbers.
#[derive(Debug, Default)]
pub struct GapTab {
    meta: TabMeta,
}

impl GapTab {
    /// An empty gap.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tab for GapTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TabMeta {
        &mut self.meta
    }

    fn kind(&self) -> TabKind {
        TabKind::Gap
    }

    fn name(&self) -> &str {
        ""
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    fn matching_names(&self) -> Vec<(u8, String)> {
        Vec::new()
    }

    fn render(&self, _frame: &mut Frame, _area: Rect, _ctx: RenderContext<'_>) {}
}
