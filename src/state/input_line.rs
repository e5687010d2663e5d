//! Editable single-line input with history.
//!
//! Every tab that accepts text owns one. Keys arrive either as a raw block of
//! text (a batch of plain characters, inserted as-is) or as a single named
//! key that edits the line.

use crate::model::key::{ENTER_KEY, PASTE_TAB_KEY};

/// What the owner of an input line should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// The line changed (or the cursor moved); nothing else to do.
    Edited,
    /// Enter was pressed; the line was cleared and this is its content.
    Submit(String),
    /// Completion was requested for the current line.
    Complete,
}

/// Text being typed plus the cursor position, counted in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    text: String,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    draft: String,
}

impl InputLine {
    /// Empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether nothing is typed.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Submitted lines, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Forget every submitted line.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.history_pos = None;
    }

    /// Replace the whole line and put the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    /// Erase the line.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Handle one key or one block of raw text.
    pub fn do_command(&mut self, key: &str, raw: bool) -> InputOutcome {
        if raw {
            self.insert_text(key);
            return InputOutcome::Edited;
        }
        match key {
            ENTER_KEY | "^M" | "\n" | "KEY_ENTER" => return self.submit(),
            PASTE_TAB_KEY => return InputOutcome::Complete,
            "KEY_BACKSPACE" | "^H" | "^?" => self.backspace(),
            "KEY_DC" | "^D" => self.delete(),
            "KEY_LEFT" => self.cursor = self.cursor.saturating_sub(1),
            "KEY_RIGHT" => self.cursor = (self.cursor + 1).min(self.len()),
            "KEY_HOME" | "^A" => self.cursor = 0,
            "KEY_END" | "^E" => self.cursor = self.len(),
            "^W" => self.delete_word_before_cursor(),
            "^U" => self.kill_to_start(),
            "^K" => self.kill_to_end(),
            "KEY_UP" => self.history_prev(),
            "KEY_DOWN" => self.history_next(),
            // unbound keys are not dropped, they become text
            other => self.insert_text(other),
        }
        InputOutcome::Edited
    }

    /// Insert text at the cursor.
    pub fn insert_text(&mut self, text: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    /// Word ending at the cursor (after the last space), used for completion.
    pub fn word_before_cursor(&self) -> &str {
        let end = self.byte_index(self.cursor);
        let head = &self.text[..end];
        match head.rfind(' ') {
            Some(space) => &head[space + 1..],
            None => head,
        }
    }

    /// Replace the word before the cursor with `word`.
    pub fn replace_word_before_cursor(&mut self, word: &str) {
        let current = self.word_before_cursor().chars().count();
        for _ in 0..current {
            self.backspace();
        }
        self.insert_text(word);
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn submit(&mut self) -> InputOutcome {
        let line = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.history_pos = None;
        self.draft.clear();
        if !line.is_empty() {
            self.history.push(line.clone());
        }
        InputOutcome::Submit(line)
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        while self.cursor > 0 && self.char_before_cursor() == Some(' ') {
            self.backspace();
        }
        while self.cursor > 0 && self.char_before_cursor().is_some_and(|c| c != ' ') {
            self.backspace();
        }
    }

    fn char_before_cursor(&self) -> Option<char> {
        self.cursor
            .checked_sub(1)
            .and_then(|pos| self.text.chars().nth(pos))
    }

    fn kill_to_start(&mut self) {
        let at = self.byte_index(self.cursor);
        self.text.replace_range(..at, "");
        self.cursor = 0;
    }

    fn kill_to_end(&mut self) {
        let at = self.byte_index(self.cursor);
        self.text.truncate(at);
    }

    fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.draft = self.text.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        let entry = self.history[pos].clone();
        self.set_text(entry);
    }

    fn history_next(&mut self) {
        let Some(pos) = self.history_pos else {
            return;
        };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            let entry = self.history[pos + 1].clone();
            self.set_text(entry);
        } else {
            self.history_pos = None;
            let draft = std::mem::take(&mut self.draft);
            self.set_text(draft);
        }
    }
}
