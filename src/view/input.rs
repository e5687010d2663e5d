//! Terminal input as key names.
//!
//! crossterm events are translated to the curses-style names bindings use:
//! `"a"`, `"^N"`, `"M-r"`, `"KEY_PPAGE"`, `"KEY_F(5)"`. Everything readable
//! without blocking is returned as one batch, so a paste arrives as a single
//! batch of many keys.

use crate::model::key::{ENTER_KEY, PASTE_TAB_KEY, RESIZE_KEY};
use crate::state::event_loop::KeySource;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

/// Name of a key press, or `None` for releases and keys with no name.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let name = match key.code {
        KeyCode::Char(c) if ctrl => control_name(c)?,
        KeyCode::Char(c) if alt => format!("M-{c}"),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => ENTER_KEY.to_string(),
        KeyCode::Tab => PASTE_TAB_KEY.to_string(),
        KeyCode::BackTab => "KEY_BTAB".to_string(),
        KeyCode::Backspace => "KEY_BACKSPACE".to_string(),
        KeyCode::Delete => "KEY_DC".to_string(),
        KeyCode::Insert => "KEY_IC".to_string(),
        KeyCode::Left => "KEY_LEFT".to_string(),
        KeyCode::Right => "KEY_RIGHT".to_string(),
        KeyCode::Up => "KEY_UP".to_string(),
        KeyCode::Down => "KEY_DOWN".to_string(),
        KeyCode::Home => "KEY_HOME".to_string(),
        KeyCode::End => "KEY_END".to_string(),
        KeyCode::PageUp => "KEY_PPAGE".to_string(),
        KeyCode::PageDown => "KEY_NPAGE".to_string(),
        KeyCode::F(n) => format!("KEY_F({n})"),
        KeyCode::Esc => "^[".to_string(),
        _ => return None,
    };
    Some(name)
}

/// `^X` name of a control combination.
fn control_name(c: char) -> Option<String> {
    match c {
        'a'..='z' | 'A'..='Z' => Some(format!("^{}", c.to_ascii_uppercase())),
        // 0x1f is reported as Ctrl+7 by most terminals
        '/' | '7' | '_' => Some("^/".to_string()),
        ' ' | '@' | '2' => Some("^@".to_string()),
        '[' | '\\' | ']' | '^' => Some(format!("^{c}")),
        _ => None,
    }
}

/// Keys carried by one terminal event.
pub fn event_keys(event: Event) -> Vec<String> {
    match event {
        Event::Key(key) => key_name(&key).into_iter().collect(),
        Event::Paste(text) => text
            .chars()
            .filter(|&c| c != '\r')
            .map(|c| match c {
                '\n' => ENTER_KEY.to_string(),
                '\t' => PASTE_TAB_KEY.to_string(),
                c => c.to_string(),
            })
            .collect(),
        Event::Resize(..) => vec![RESIZE_KEY.to_string()],
        _ => Vec::new(),
    }
}

/// Reads key batches from the terminal.
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn read_keys(&mut self, timeout: Duration) -> io::Result<Option<Vec<String>>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let mut batch = event_keys(event::read()?);
        while event::poll(Duration::ZERO)? {
            batch.extend(event_keys(event::read()?));
        }
        if batch.is_empty() {
            // only releases or mouse noise
            return Ok(None);
        }
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<String> {
        key_name(&KeyEvent::new(code, modifiers))
    }

    #[test]
    fn printable_keys_are_themselves() {
        assert_eq!(press(KeyCode::Char('a'), KeyModifiers::NONE).as_deref(), Some("a"));
        assert_eq!(press(KeyCode::Char('A'), KeyModifiers::SHIFT).as_deref(), Some("A"));
        assert_eq!(press(KeyCode::Char('é'), KeyModifiers::NONE).as_deref(), Some("é"));
    }

    #[test]
    fn control_and_meta_combinations() {
        assert_eq!(press(KeyCode::Char('n'), KeyModifiers::CONTROL).as_deref(), Some("^N"));
        assert_eq!(press(KeyCode::Char('r'), KeyModifiers::ALT).as_deref(), Some("M-r"));
        assert_eq!(press(KeyCode::Char('1'), KeyModifiers::ALT).as_deref(), Some("M-1"));
        assert_eq!(press(KeyCode::Char('7'), KeyModifiers::CONTROL).as_deref(), Some("^/"));
    }

    #[test]
    fn special_keys_use_curses_names() {
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE).as_deref(), Some("^J"));
        assert_eq!(press(KeyCode::Tab, KeyModifiers::NONE).as_deref(), Some("^I"));
        assert_eq!(press(KeyCode::PageUp, KeyModifiers::NONE).as_deref(), Some("KEY_PPAGE"));
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE).as_deref(), Some("KEY_F(5)"));
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(key_name(&key), None);
    }

    #[test]
    fn paste_splits_into_keys() {
        let keys = event_keys(Event::Paste("a\tb\r\nc".to_string()));
        assert_eq!(keys, vec!["a", "^I", "b", "^J", "c"]);
    }

    #[test]
    fn resize_becomes_resize_key() {
        assert_eq!(event_keys(Event::Resize(100, 40)), vec![RESIZE_KEY]);
    }
}
