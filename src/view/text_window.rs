//! Scrollable window of wrapped message lines.
//!
//! A [`TextWindow`] is the render target attached to a message log. It keeps
//! pre-wrapped lines tagged with the correlation id of the message that
//! produced them, so a correction can swap exactly those lines.

use crate::model::message::{CorrelationId, Message};
use crate::state::message_log::MessageView;
use crate::tabs::Scroll;
use crate::view::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, MAX_WINDOW_LINES};
use crate::view::styles::ChatStyles;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Nickname shown for info messages of the error kind.
const ERROR_NICK: &str = "Error";

/// How the body of a line is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Plain message body.
    Normal,
    /// Message that mentions us.
    Highlight,
    /// `/me` action.
    Action,
    /// Informational notice.
    Info,
    /// Error notice.
    Error,
}

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltLine {
    id: Option<CorrelationId>,
    time: Option<String>,
    nickname: Option<String>,
    indent: usize,
    text: String,
    kind: LineKind,
    corrected: bool,
}

impl BuiltLine {
    /// Correlation id of the message this row belongs to.
    pub fn id(&self) -> Option<&CorrelationId> {
        self.id.as_ref()
    }

    /// Body text of the row.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How the body is styled.
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// The row as plain text, prefix included.
    pub fn plain(&self) -> String {
        let mut out = String::new();
        if let Some(time) = &self.time {
            out.push_str(time);
            out.push(' ');
        }
        match &self.nickname {
            Some(nick) if self.kind == LineKind::Action => {
                out.push_str("* ");
                out.push_str(nick);
                out.push(' ');
            }
            Some(nick) => {
                out.push_str(nick);
                out.push_str("> ");
            }
            None if self.time.is_none() => out.push_str(&" ".repeat(self.indent)),
            None => {}
        }
        out.push_str(&self.text);
        out
    }

    fn to_line(&self, styles: &ChatStyles) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(time) = &self.time {
            spans.push(Span::styled(format!("{time} "), styles.time()));
        }
        let nick_style = if self.corrected {
            styles.corrected()
        } else {
            styles.nickname()
        };
        match &self.nickname {
            Some(nick) if self.kind == LineKind::Action => {
                spans.push(Span::styled(format!("* {nick} "), nick_style));
            }
            Some(nick) => spans.push(Span::styled(format!("{nick}> "), nick_style)),
            None if self.time.is_none() => spans.push(Span::raw(" ".repeat(self.indent))),
            None => {}
        }
        spans.push(Span::styled(
            self.text.clone(),
            styles.style_for_line(self.kind),
        ));
        Line::from(spans)
    }
}

/// Wrap `text` to `width` columns, breaking at spaces when possible.
///
/// Embedded newlines always start a new row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let start = out.len();
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_inclusive(' ') {
            let word_width = word.width();
            if line_width + word_width <= width {
                line.push_str(word);
                line_width += word_width;
                continue;
            }
            if !line.is_empty() {
                out.push(line.trim_end().to_string());
                line.clear();
                line_width = 0;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width + ch_width > width && !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                if line.is_empty() && ch == ' ' {
                    continue;
                }
                line.push(ch);
                line_width += ch_width;
            }
        }
        if !line.is_empty() || out.len() == start {
            out.push(line.trim_end().to_string());
        }
    }
    out
}

/// Scrollable view onto a message log.
#[derive(Debug, Clone)]
pub struct TextWindow {
    lines: Vec<BuiltLine>,
    width: u16,
    height: u16,
    pos: usize,
    info: bool,
    max_lines: usize,
}

impl Default for TextWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl TextWindow {
    /// Empty window of the default size.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            pos: 0,
            info: false,
            max_lines: MAX_WINDOW_LINES,
        }
    }

    /// Window for the information buffer: bodies are styled by kind.
    pub fn for_info() -> Self {
        Self {
            info: true,
            ..Self::new()
        }
    }

    /// Width lines are wrapped to.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of visible rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Every built row, oldest first.
    pub fn lines(&self) -> &[BuiltLine] {
        &self.lines
    }

    /// Rows scrolled up from the bottom.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Store new dimensions. Lines are not rewrapped until
    /// [`MessageView::rebuild`].
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.pos = self.pos.min(self.max_scroll());
    }

    /// Rows currently on screen, oldest first.
    pub fn visible_lines(&self) -> &[BuiltLine] {
        let end = self.lines.len().saturating_sub(self.pos);
        let start = end.saturating_sub(self.height as usize);
        &self.lines[start..end]
    }

    /// Scroll towards newer rows, stopping at the bottom.
    pub fn scroll_down(&mut self, lines: usize) {
        self.pos = self.pos.saturating_sub(lines);
    }

    /// Follow new messages again.
    pub fn scroll_to_bottom(&mut self) {
        self.pos = 0;
    }

    /// Apply a scroll request, pages sized by the window height.
    pub fn apply_scroll(&mut self, scroll: Scroll) {
        let page = (self.height as usize).max(1);
        match scroll {
            Scroll::LineUp => self.scroll_up(1),
            Scroll::LineDown => self.scroll_down(1),
            Scroll::HalfUp => self.scroll_up(page / 2),
            Scroll::HalfDown => self.scroll_down(page / 2),
            Scroll::PageUp => self.scroll_up(page),
            Scroll::PageDown => self.scroll_down(page),
        }
    }

    /// Draw the visible rows into `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect, styles: &ChatStyles) {
        let lines: Vec<Line> = self
            .visible_lines()
            .iter()
            .map(|line| line.to_line(styles))
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    fn trim(&mut self) {
        if self.lines.len() > self.max_lines {
            let excess = self.lines.len() - self.max_lines;
            self.lines.drain(..excess);
        }
    }

    fn line_kind(&self, message: &Message, highlight: bool) -> LineKind {
        if self.info {
            return match message.author_nickname() {
                Some(ERROR_NICK) => LineKind::Error,
                _ => LineKind::Info,
            };
        }
        if highlight {
            LineKind::Highlight
        } else if message.is_action() {
            LineKind::Action
        } else {
            LineKind::Normal
        }
    }

    fn build_lines(&self, message: &Message, highlight: bool, show_timestamp: bool) -> Vec<BuiltLine> {
        let kind = self.line_kind(message, highlight);
        let time = show_timestamp.then(|| message.display_time().as_str().to_string());
        let nickname = message.author_nickname().map(str::to_string);

        let mut indent = time.as_ref().map_or(0, |t| t.width() + 1);
        if let Some(nick) = &nickname {
            // "nick> " or "* nick "
            indent += nick.width() + 2;
        }
        let text_width = (self.width as usize).saturating_sub(indent).max(1);

        wrap_text(message.text(), text_width)
            .into_iter()
            .enumerate()
            .map(|(i, text)| BuiltLine {
                id: message.correlation_id().cloned(),
                time: if i == 0 { time.clone() } else { None },
                nickname: if i == 0 { nickname.clone() } else { None },
                indent,
                text,
                kind,
                corrected: message.revision_count() > 0,
            })
            .collect()
    }
}

impl MessageView for TextWindow {
    fn build_new_message(
        &mut self,
        message: &Message,
        _history: bool,
        highlight: bool,
        show_timestamp: bool,
    ) -> usize {
        let built = self.build_lines(message, highlight || message.is_highlighted(), show_timestamp);
        let count = built.len();
        self.lines.extend(built);
        self.trim();
        count
    }

    fn modify_message(&mut self, old_id: &CorrelationId, message: &Message, show_timestamp: bool) {
        let Some(start) = self.lines.iter().position(|l| l.id.as_ref() == Some(old_id)) else {
            return;
        };
        let end = self.lines[start..]
            .iter()
            .position(|l| l.id.as_ref() != Some(old_id))
            .map_or(self.lines.len(), |n| start + n);
        let built = self.build_lines(message, message.is_highlighted(), show_timestamp);
        self.lines.splice(start..end, built);
        self.pos = self.pos.min(self.max_scroll());
    }

    fn scroll_offset(&self) -> usize {
        self.pos
    }

    fn scroll_up(&mut self, lines: usize) {
        self.pos = (self.pos + lines).min(self.max_scroll());
    }

    /// The scroll offset survives, clamped to the new content.
    fn rebuild<'a>(&mut self, messages: impl Iterator<Item = &'a Message>, show_timestamp: bool) {
        self.lines.clear();
        for message in messages {
            let built = self.build_lines(message, message.is_highlighted(), show_timestamp);
            self.lines.extend(built);
        }
        self.trim();
        self.pos = self.pos.min(self.max_scroll());
    }
}
