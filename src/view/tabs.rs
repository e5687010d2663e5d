//! Tab bar widget.
//!
//! One line: `[0|1|3] name`. Each number is styled by the tab's attention
//! state; gaps are skipped so the numbers shown are the real slot numbers.

use crate::state::tab_list::TabSlotList;
use crate::view::styles::ChatStyles;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Build the tab bar line for `tabs`.
pub fn tab_bar_line(tabs: &TabSlotList, styles: &ChatStyles) -> Line<'static> {
    let mut spans = vec![Span::raw("[")];
    let mut first = true;
    for tab in tabs.iter().filter(|t| !t.is_placeholder()) {
        if !first {
            spans.push(Span::raw("|"));
        }
        first = false;
        spans.push(Span::styled(
            tab.number().to_string(),
            styles.style_for_tab(tab.focus_state()),
        ));
    }
    spans.push(Span::raw("] "));
    spans.push(Span::raw(tabs.current().name().to_string()));
    Line::from(spans)
}

/// Render the tab bar.
pub fn render_tab_bar(frame: &mut Frame, area: Rect, tabs: &TabSlotList, styles: &ChatStyles) {
    frame.render_widget(Paragraph::new(tab_bar_line(tabs, styles)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::{ConversationKind, ConversationTab, RosterInfoTab};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn list(gaps: bool) -> TabSlotList {
        let mut tabs = TabSlotList::new(Box::new(RosterInfoTab::new()), gaps);
        for name in ["alpha", "beta", "gamma"] {
            tabs.push(
                Box::new(ConversationTab::new(name, ConversationKind::Room, 10)),
                false,
            );
        }
        tabs
    }

    fn rendered(tabs: &TabSlotList) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 1)).unwrap();
        terminal
            .draw(|frame| render_tab_bar(frame, frame.area(), tabs, &ChatStyles::default()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn lists_every_number_and_current_name() {
        let tabs = list(false);
        assert!(rendered(&tabs).starts_with("[0|1|2|3] Roster"));
    }

    #[test]
    fn gaps_are_skipped_but_numbers_kept() {
        let mut tabs = list(true);
        tabs.close(2).unwrap();
        tabs.focus(3).unwrap();
        assert!(rendered(&tabs).starts_with("[0|1|3] gamma"));
    }

    #[test]
    fn attention_state_styles_the_number() {
        let mut tabs = list(false);
        tabs.notify(2, crate::tabs::FocusState::Highlight);
        let styles = ChatStyles::default();
        let line = tab_bar_line(&tabs, &styles);
        let two = line
            .spans
            .iter()
            .find(|s| s.content == "2")
            .expect("tab 2 is listed");
        assert_eq!(
            two.style,
            styles.style_for_tab(crate::tabs::FocusState::Highlight)
        );
    }
}
