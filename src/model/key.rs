//! Key tokens as produced by one read of the input device.
//!
//! Keys are named the way curses-style configuration files name them:
//! a printable character is itself (`"a"`), control combinations are
//! `"^X"`, meta combinations are `"M-x"`, and everything else has a
//! `KEY_*` name (`"KEY_LEFT"`, `"KEY_F(5)"`, `"KEY_RESIZE"`). Bindings,
//! aliases and actions are all keyed by these names.

/// Raw key name of the completion key; a literal tab when part of a paste.
pub const PASTE_TAB_KEY: &str = "^I";

/// Literal character a [`PASTE_TAB_KEY`] becomes inside a longer batch.
pub const PASTE_TAB_LITERAL: char = '\t';

/// Escape byte emitted by some terminals for `C-/`.
pub const DEFAULT_ESCAPE_BYTE: char = '\x1f';

/// Canonical name the escape byte is remapped to.
pub const ESCAPE_KEY_NAME: &str = "^/";

/// Name of the key produced by `Enter`.
pub const ENTER_KEY: &str = "^J";

/// Pseudo-key delivered when the terminal is resized.
pub const RESIZE_KEY: &str = "KEY_RESIZE";

/// Action names beginning with this prefix run the rest as a command.
pub const EXEC_PREFIX: &str = "_exc_";

/// A single key token.
///
/// `Char` holds exactly one printable character; anything else is `Special`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    /// A single printable character.
    Char(char),
    /// Anything else: control, meta or curses key names.
    Special(String),
}

impl KeyToken {
    /// Classify a key name: one character is plain, longer names are special.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeyToken::Char(c),
            _ => KeyToken::Special(name.to_string()),
        }
    }

    /// The key name this token was read from.
    pub fn name(&self) -> String {
        match self {
            KeyToken::Char(c) => c.to_string(),
            KeyToken::Special(s) => s.clone(),
        }
    }

    /// Printable, so it can be inserted as text.
    pub fn is_plain(&self) -> bool {
        matches!(self, KeyToken::Char(_))
    }
}

/// Parse a `M-<digit>` key name into its digit.
pub fn meta_digit(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("M-")?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10),
        _ => None,
    }
}

/// Suffix of an `_exc_<command>` action name, if it has one.
pub fn exec_suffix(name: &str) -> Option<&str> {
    name.strip_prefix(EXEC_PREFIX).filter(|rest| !rest.is_empty())
}
