//! Keyboard bindings configuration.
//!
//! The `[bindings]` table of the config file maps a key name to the key it
//! should behave as, to an action name (`_show_roster`), or to a command
//! through the `_exc_` prefix (`_exc_quit`).

use crate::state::key_router::KeyRouter;
use serde::Deserialize;
use std::collections::BTreeMap;

/// User key aliases, in key-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: BTreeMap<String, String>,
}

impl KeyBindings {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// What `key` is bound to, if anything.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.bindings.get(key).map(String::as_str)
    }

    /// Bind `key` to `target`, replacing any earlier binding.
    pub fn insert(&mut self, key: impl Into<String>, target: impl Into<String>) {
        self.bindings.insert(key.into(), target.into());
    }

    /// Drop the binding of `key`, returning its target.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.bindings.remove(key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no key is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings as `(key, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Install every binding as a router alias.
    pub fn apply_to(&self, router: &mut KeyRouter) {
        for (key, target) in self.iter() {
            router.set_alias(key, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_toml_table() {
        let bindings: KeyBindings = toml::from_str(
            r#"
"M-q" = "_exc_quit"
"^X" = "^N"
"#,
        )
        .expect("valid bindings table");
        assert_eq!(bindings.get("M-q"), Some("_exc_quit"));
        assert_eq!(bindings.get("^X"), Some("^N"));
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn apply_installs_router_aliases() {
        let mut bindings = KeyBindings::new();
        bindings.insert("^X", "^N");
        let mut router = KeyRouter::new();
        bindings.apply_to(&mut router);
        assert_eq!(router.replace_key_with_bound("^X"), "^N");
        assert_eq!(router.replace_key_with_bound("^Y"), "^Y");
    }

    #[test]
    fn remove_returns_old_target() {
        let mut bindings = KeyBindings::new();
        bindings.insert("a", "b");
        assert_eq!(bindings.remove("a").as_deref(), Some("b"));
        assert!(bindings.is_empty());
    }
}
