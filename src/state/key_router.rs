//! Classification of raw key batches.
//!
//! One read of the input device yields a batch of key names. A batch longer
//! than one key is usually a paste, so printable keys are grouped into
//! literal runs and `^I` inside it is a literal tab rather than completion.
//! Special keys are resolved against the [`ActionTable`]; what is left goes
//! to the focused tab.

use crate::model::key::{
    exec_suffix, meta_digit, KeyToken, DEFAULT_ESCAPE_BYTE, ESCAPE_KEY_NAME, PASTE_TAB_KEY,
    PASTE_TAB_LITERAL,
};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Action that makes the router read the next two digits as a tab number.
pub const GO_TO_ROOM_NUMBER: &str = "_go_to_room_number";

/// Action that makes the router escape the next key.
pub const ESCAPE_NEXT_KEY: &str = "_escape_next_key";

/// Runs a bound action on the context.
pub type ActionHandler<C> = fn(&mut C);

/// What to do with one piece of a key batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Printable text to insert as-is.
    Literal(String),
    /// A named action from the table.
    Action(String),
    /// A command line bound through an `_exc_` action.
    ExecCommand(String),
    /// Jump to a tab by number (`M-<digits>` or the go-to-number prompt).
    TabNumber(usize),
    /// Unbound special key for the focused tab.
    Key(String),
}

/// Named actions and the keys bound to them.
///
/// Actions are named with a leading underscore (`_show_roster`); a key maps
/// to an action name. A name can be looked up either way.
pub struct ActionTable<C> {
    actions: BTreeMap<String, ActionHandler<C>>,
    keys: BTreeMap<String, String>,
    escaped_keys: BTreeMap<String, String>,
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
            keys: BTreeMap::new(),
            escaped_keys: BTreeMap::new(),
        }
    }
}

impl<C> std::fmt::Debug for ActionTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("keys", &self.keys)
            .field("escaped_keys", &self.escaped_keys)
            .finish()
    }
}

impl<C> ActionTable<C> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) an action.
    pub fn define(&mut self, name: impl Into<String>, handler: ActionHandler<C>) {
        self.actions.insert(name.into(), handler);
    }

    /// Bind `key` to an existing action. Returns `false` if no such action.
    pub fn bind_key(&mut self, key: impl Into<String>, action: &str) -> bool {
        if !self.actions.contains_key(action) {
            return false;
        }
        self.keys.insert(key.into(), action.to_string());
        true
    }

    /// Bind a key that only acts right after the escape key.
    pub fn bind_escaped(&mut self, key: impl Into<String>, action: &str) -> bool {
        if !self.actions.contains_key(action) {
            return false;
        }
        self.escaped_keys.insert(key.into(), action.to_string());
        true
    }

    /// Remove the binding of `key`. Returns whether it was bound.
    pub fn unbind_key(&mut self, key: &str) -> bool {
        self.keys.remove(key).is_some()
    }

    /// Action for a key name or an action name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((action, _)) = self.actions.get_key_value(name) {
            return Some(action.as_str());
        }
        self.keys.get(name).map(String::as_str)
    }

    /// Action bound to `name` right after the escape key.
    pub fn resolve_escaped(&self, name: &str) -> Option<&str> {
        self.escaped_keys.get(name).map(String::as_str)
    }

    /// Function run by `action`.
    pub fn handler(&self, action: &str) -> Option<ActionHandler<C>> {
        self.actions.get(action).copied()
    }

    /// Every defined action name.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Keys bound to `action`.
    pub fn keys_for(&self, action: &str) -> Vec<&str> {
        self.keys
            .iter()
            .filter(|(_, a)| a.as_str() == action)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Splits key batches into [`Dispatch`]es.
///
/// Holds the state that spans batches: a pending escape and a pending
/// tab-number prompt.
#[derive(Debug, Clone)]
pub struct KeyRouter {
    escape_byte: char,
    aliases: HashMap<String, String>,
    escape_pending: bool,
    digits: Option<String>,
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyRouter {
    /// Router with the default escape byte and no aliases.
    pub fn new() -> Self {
        Self {
            escape_byte: DEFAULT_ESCAPE_BYTE,
            aliases: HashMap::new(),
            escape_pending: false,
            digits: None,
        }
    }

    /// Use `escape_byte` as the escape key.
    pub fn with_escape_byte(mut self, escape_byte: char) -> Self {
        self.escape_byte = escape_byte;
        self
    }

    /// Make `key` behave as `target` (another key or an action name).
    pub fn set_alias(&mut self, key: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(key.into(), target.into());
    }

    /// Drop the alias of `key`. Returns whether there was one.
    pub fn remove_alias(&mut self, key: &str) -> bool {
        self.aliases.remove(key).is_some()
    }

    /// Every alias, key to target.
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    /// The key `key` stands for after alias substitution.
    pub fn replace_key_with_bound<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map_or(key, String::as_str)
    }

    /// Whether the next key is escaped.
    pub fn is_escape_pending(&self) -> bool {
        self.escape_pending
    }

    /// Whether a tab number is being typed.
    pub fn is_reading_digits(&self) -> bool {
        self.digits.is_some()
    }

    /// Look the next key up in the escaped table.
    pub fn arm_escape(&mut self) {
        self.escape_pending = true;
    }

    /// Start reading a two-digit tab number from the next keys.
    pub fn arm_tab_number(&mut self) {
        self.digits = Some(String::new());
    }

    /// Drop any pending escape or digit prompt.
    pub fn reset(&mut self) {
        self.escape_pending = false;
        self.digits = None;
    }

    /// Replace the escape byte by its canonical name in a batch.
    pub fn normalize<S: AsRef<str>>(&self, batch: &[S]) -> Vec<String> {
        let escape = self.escape_byte.to_string();
        batch
            .iter()
            .map(|k| {
                let k = k.as_ref();
                if k == escape {
                    ESCAPE_KEY_NAME.to_string()
                } else {
                    k.to_string()
                }
            })
            .collect()
    }

    /// Normalise the escape byte, then substitute aliases, in a batch.
    pub fn translate<S: AsRef<str>>(&self, batch: &[S]) -> Vec<String> {
        self.normalize(batch)
            .iter()
            .map(|key| self.replace_key_with_bound(key).to_string())
            .collect()
    }

    /// Classify a batch of keys.
    pub fn route<C, S: AsRef<str>>(&mut self, batch: &[S], actions: &ActionTable<C>) -> Vec<Dispatch> {
        let keys = self.translate(batch);
        self.route_translated(&keys, keys.len() != 1, actions)
    }

    /// Classify keys that already went through [`KeyRouter::translate`].
    ///
    /// `paste` says whether they came in a batch of more than one key.
    pub fn route_translated<C>(
        &mut self,
        keys: &[String],
        paste: bool,
        actions: &ActionTable<C>,
    ) -> Vec<Dispatch> {
        let mut out: Vec<Dispatch> = Vec::new();
        let mut meta_digits = String::new();

        for raw in keys {
            let key = raw.clone();

            if self.feed_digit_prompt(&key, &mut out) {
                continue;
            }

            if self.escape_pending {
                flush_meta_digits(&mut meta_digits, &mut out);
                self.escape_pending = false;
                match actions.resolve_escaped(&key) {
                    Some(action) => out.push(Dispatch::Action(action.to_string())),
                    None => push_literal(&mut out, &key),
                }
                continue;
            }

            if let Some(digit) = meta_digit(&key) {
                if meta_digits.len() == 2 {
                    flush_meta_digits(&mut meta_digits, &mut out);
                }
                meta_digits.push_str(&digit.to_string());
                continue;
            }
            flush_meta_digits(&mut meta_digits, &mut out);
            if key == ESCAPE_KEY_NAME && actions.resolve(&key).is_none() {
                self.escape_pending = true;
                continue;
            }

            if paste && key == PASTE_TAB_KEY {
                push_literal(&mut out, &PASTE_TAB_LITERAL.to_string());
                continue;
            }
            if let Some(command) = exec_suffix(&key) {
                out.push(Dispatch::ExecCommand(command.to_string()));
                continue;
            }
            match actions.resolve(&key) {
                Some(GO_TO_ROOM_NUMBER) => self.arm_tab_number(),
                Some(ESCAPE_NEXT_KEY) => self.arm_escape(),
                Some(action) => out.push(Dispatch::Action(action.to_string())),
                None if KeyToken::from_name(&key).is_plain() => push_literal(&mut out, &key),
                None => out.push(Dispatch::Key(key)),
            }
        }
        flush_meta_digits(&mut meta_digits, &mut out);
        trace!(?out, "Routed key batch");
        out
    }

    /// Consume `key` if a tab-number prompt is active. Returns whether it
    /// was consumed.
    fn feed_digit_prompt(&mut self, key: &str, out: &mut Vec<Dispatch>) -> bool {
        let Some(digits) = self.digits.as_mut() else {
            return false;
        };
        match KeyToken::from_name(key) {
            KeyToken::Char(c) if c.is_ascii_digit() => {
                digits.push(c);
                if digits.len() == 2 {
                    if let Ok(n) = digits.parse() {
                        out.push(Dispatch::TabNumber(n));
                    }
                    self.digits = None;
                }
                true
            }
            // anything else cancels the prompt and is handled normally
            _ => {
                self.digits = None;
                false
            }
        }
    }
}

fn push_literal(out: &mut Vec<Dispatch>, text: &str) {
    if let Some(Dispatch::Literal(run)) = out.last_mut() {
        run.push_str(text);
    } else {
        out.push(Dispatch::Literal(text.to_string()));
    }
}

fn flush_meta_digits(digits: &mut String, out: &mut Vec<Dispatch>) {
    if digits.is_empty() {
        return;
    }
    if let Ok(n) = digits.parse() {
        out.push(Dispatch::TabNumber(n));
    }
    digits.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ()) {}

    fn table() -> ActionTable<()> {
        let mut t = ActionTable::new();
        t.define("_room_right", noop);
        t.define("_show_roster", noop);
        t.define(GO_TO_ROOM_NUMBER, noop);
        t.define(ESCAPE_NEXT_KEY, noop);
        t.bind_key("^N", "_room_right");
        t.bind_key("M-k", ESCAPE_NEXT_KEY);
        t.bind_key("M-j", GO_TO_ROOM_NUMBER);
        t.bind_escaped("r", "_show_roster");
        t
    }

    fn route(router: &mut KeyRouter, keys: &[&str]) -> Vec<Dispatch> {
        router.route(keys, &table())
    }

    fn lit(s: &str) -> Dispatch {
        Dispatch::Literal(s.to_string())
    }

    #[test]
    fn printable_keys_form_one_literal_run() {
        let mut r = KeyRouter::new();
        assert_eq!(route(&mut r, &["h", "e", "y"]), vec![lit("hey")]);
    }

    #[test]
    fn special_key_splits_runs() {
        let mut r = KeyRouter::new();
        assert_eq!(
            route(&mut r, &["a", "KEY_LEFT", "b"]),
            vec![lit("a"), Dispatch::Key("KEY_LEFT".to_string()), lit("b")]
        );
    }

    #[test]
    fn bound_key_becomes_action() {
        let mut r = KeyRouter::new();
        assert_eq!(
            route(&mut r, &["^N"]),
            vec![Dispatch::Action("_room_right".to_string())]
        );
    }

    #[test]
    fn tab_key_alone_requests_completion() {
        let mut r = KeyRouter::new();
        assert_eq!(route(&mut r, &["^I"]), vec![Dispatch::Key("^I".to_string())]);
    }

    #[test]
    fn tab_key_in_paste_is_literal() {
        let mut r = KeyRouter::new();
        assert_eq!(route(&mut r, &["a", "^I", "b"]), vec![lit("a\tb")]);
    }

    #[test]
    fn escape_byte_is_remapped() {
        let r = KeyRouter::new();
        assert_eq!(r.normalize(&["\x1f", "a"]), vec!["^/", "a"]);
    }

    #[test]
    fn escape_affects_exactly_next_key() {
        let mut r = KeyRouter::new();
        assert!(route(&mut r, &["\x1f"]).is_empty());
        assert!(r.is_escape_pending());
        assert_eq!(
            route(&mut r, &["r"]),
            vec![Dispatch::Action("_show_roster".to_string())]
        );
        assert_eq!(route(&mut r, &["r"]), vec![lit("r")]);
    }

    #[test]
    fn escape_action_applies_within_the_same_batch() {
        let mut r = KeyRouter::new();
        assert_eq!(
            route(&mut r, &["M-k", "r", "r"]),
            vec![Dispatch::Action("_show_roster".to_string()), lit("r")]
        );
        assert!(!r.is_escape_pending());
    }

    #[test]
    fn escaped_unbound_key_is_inserted_literally() {
        let mut r = KeyRouter::new();
        assert_eq!(route(&mut r, &["^/", "^N"]), vec![lit("^N")]);
    }

    #[test]
    fn meta_digits_combine_into_tab_number() {
        let mut r = KeyRouter::new();
        assert_eq!(route(&mut r, &["M-1", "M-2"]), vec![Dispatch::TabNumber(12)]);
        assert_eq!(route(&mut r, &["M-3"]), vec![Dispatch::TabNumber(3)]);
    }

    #[test]
    fn go_to_number_reads_two_digits_across_batches() {
        let mut r = KeyRouter::new();
        assert!(route(&mut r, &["M-j"]).is_empty());
        assert!(r.is_reading_digits());
        assert!(route(&mut r, &["1"]).is_empty());
        assert_eq!(route(&mut r, &["4"]), vec![Dispatch::TabNumber(14)]);
        assert!(!r.is_reading_digits());
    }

    #[test]
    fn non_digit_cancels_number_prompt() {
        let mut r = KeyRouter::new();
        route(&mut r, &["M-j"]);
        assert_eq!(route(&mut r, &["x"]), vec![lit("x")]);
        assert!(!r.is_reading_digits());
    }

    #[test]
    fn alias_replaces_key_before_lookup() {
        let mut r = KeyRouter::new();
        r.set_alias("^X", "^N");
        assert_eq!(
            route(&mut r, &["^X"]),
            vec![Dispatch::Action("_room_right".to_string())]
        );
    }

    #[test]
    fn exec_binding_runs_command() {
        let mut r = KeyRouter::new();
        r.set_alias("M-q", "_exc_quit");
        assert_eq!(
            route(&mut r, &["M-q"]),
            vec![Dispatch::ExecCommand("quit".to_string())]
        );
    }

    #[test]
    fn action_name_can_be_bound_directly() {
        let mut r = KeyRouter::new();
        r.set_alias("M-r", "_show_roster");
        assert_eq!(
            route(&mut r, &["M-r"]),
            vec![Dispatch::Action("_show_roster".to_string())]
        );
    }

    #[test]
    fn table_lists_keys_for_action() {
        let t = table();
        assert_eq!(t.keys_for("_room_right"), vec!["^N"]);
        assert!(!ActionTable::<()>::new().bind_key("x", "_missing"));
    }

    #[test]
    fn resolve_accepts_action_and_key_names() {
        let t = table();
        let resolved = {
            let name = String::from("_room_right");
            t.resolve(&name).map(str::to_string)
        };
        assert_eq!(resolved.as_deref(), Some("_room_right"));
        assert_eq!(t.resolve("^N"), Some("_room_right"));
        assert_eq!(t.resolve("^Q"), None);
    }
}
