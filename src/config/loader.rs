//! Configuration file loading with precedence handling.

use super::keybindings::KeyBindings;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable selecting the config file.
pub const CONFIG_ENV: &str = "CHATMUX_CONFIG";

/// Environment variable overriding the own nickname.
pub const NICK_ENV: &str = "CHATMUX_NICK";

/// Nickname used when neither config nor `$USER` provide one.
pub const FALLBACK_NICK: &str = "chatmux";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/chatmux/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Keep gaps in the tab list when tabs are closed or moved.
    #[serde(default)]
    pub create_gaps: Option<bool>,

    /// Messages kept per conversation.
    #[serde(default)]
    pub max_messages_in_memory: Option<usize>,

    /// Show a time before every message.
    #[serde(default)]
    pub show_timestamps: Option<bool>,

    /// Height of the information strip.
    #[serde(default)]
    pub info_win_height: Option<u16>,

    /// Seconds an information popup stays grown.
    #[serde(default)]
    pub popup_time: Option<u64>,

    /// Space-separated information kinds that pop the strip up.
    #[serde(default)]
    pub information_buffer_popup_on: Option<String>,

    /// `:`-separated substrings; matching information messages are dropped.
    #[serde(default)]
    pub filter_info_messages: Option<String>,

    /// Nickname for our own messages and highlight detection.
    #[serde(default)]
    pub own_nick: Option<String>,

    /// Input read timeout before timed events are checked.
    #[serde(default)]
    pub input_timeout_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Key aliases.
    #[serde(default)]
    pub bindings: Option<KeyBindings>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Keep closed tabs as gaps so numbers never shift.
    pub create_gaps: bool,
    /// Messages kept per conversation.
    pub max_messages_in_memory: usize,
    /// Show message times.
    pub show_timestamps: bool,
    /// Resting height of the information strip.
    pub info_win_height: u16,
    /// Seconds a popped-up strip stays grown.
    pub popup_time: u64,
    /// Information kinds that pop the strip up.
    pub information_buffer_popup_on: Vec<String>,
    /// Substrings that drop an information message.
    pub filter_info_messages: Vec<String>,
    /// Our nickname, also used for highlights.
    pub own_nick: String,
    /// Milliseconds to wait for input before servicing timers.
    pub input_timeout_ms: u64,
    /// Where tracing output goes.
    pub log_file_path: PathBuf,
    /// User key aliases.
    pub bindings: KeyBindings,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            create_gaps: false,
            max_messages_in_memory: 2048,
            show_timestamps: true,
            info_win_height: 2,
            popup_time: 4,
            information_buffer_popup_on: split_words("error warning help"),
            filter_info_messages: Vec::new(),
            own_nick: default_nick(),
            input_timeout_ms: 1000,
            log_file_path: default_log_path(),
            bindings: KeyBindings::default(),
        }
    }
}

impl ResolvedConfig {
    /// Whether information messages of `kind` grow the strip.
    pub fn pops_up_on(&self, kind: &str) -> bool {
        let kind = kind.to_lowercase();
        self.information_buffer_popup_on.iter().any(|k| *k == kind)
    }

    /// Whether `text` matches one of the information filters.
    pub fn is_filtered(&self, text: &str) -> bool {
        self.filter_info_messages
            .iter()
            .any(|f| text.contains(f.as_str()))
    }
}

fn split_words(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_lowercase).collect()
}

fn split_filters(raw: &str) -> Vec<String> {
    raw.split(':')
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// `$USER`, or a fixed fallback.
pub fn default_nick() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| FALLBACK_NICK.to_string())
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/chatmux/chatmux.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chatmux").join("chatmux.log")
    } else {
        PathBuf::from("chatmux.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/chatmux/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatmux").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `CHATMUX_CONFIG` environment variable
/// 3. Default path `~/.config/chatmux/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `CHATMUX_NICK`: Override own nickname
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(nick) = std::env::var(NICK_ENV) {
        if !nick.is_empty() {
            config.own_nick = nick;
        }
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        create_gaps: config.create_gaps.unwrap_or(defaults.create_gaps),
        max_messages_in_memory: config
            .max_messages_in_memory
            .unwrap_or(defaults.max_messages_in_memory),
        show_timestamps: config.show_timestamps.unwrap_or(defaults.show_timestamps),
        info_win_height: config.info_win_height.unwrap_or(defaults.info_win_height),
        popup_time: config.popup_time.unwrap_or(defaults.popup_time),
        information_buffer_popup_on: config
            .information_buffer_popup_on
            .as_deref()
            .map(split_words)
            .unwrap_or(defaults.information_buffer_popup_on),
        filter_info_messages: config
            .filter_info_messages
            .as_deref()
            .map(split_filters)
            .unwrap_or(defaults.filter_info_messages),
        own_nick: config
            .own_nick
            .filter(|n| !n.is_empty())
            .unwrap_or(defaults.own_nick),
        input_timeout_ms: config.input_timeout_ms.unwrap_or(defaults.input_timeout_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        bindings: config.bindings.unwrap_or(defaults.bindings),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    nick_override: Option<String>,
    gaps_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(nick) = nick_override {
        config.own_nick = nick;
    }

    if let Some(gaps) = gaps_override {
        config.create_gaps = gaps;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
