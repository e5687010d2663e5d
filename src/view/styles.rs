//! Line and tab styling.
//!
//! Provides distinct colors for highlights, actions, info messages and tab
//! attention states.

use crate::tabs::FocusState;
use crate::view::text_window::LineKind;
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Whether colors are used.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self::from_env_and_args(false)
    }
}

// ===== ChatStyles =====

/// Styles for message lines and the tab bar.
#[derive(Debug, Clone, Copy)]
pub struct ChatStyles {
    time: Style,
    nickname: Style,
    highlight: Style,
    action: Style,
    info: Style,
    error: Style,
    corrected: Style,
    tab_current: Style,
    tab_active: Style,
    tab_private: Style,
    tab_highlight: Style,
    tab_none: Style,
}

impl ChatStyles {
    /// Styles for the given color choice.
    pub fn with_color_config(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                time: Style::default().fg(Color::DarkGray),
                nickname: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                highlight: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                action: Style::default().fg(Color::Magenta),
                info: Style::default().fg(Color::Green),
                error: Style::default().fg(Color::Red),
                corrected: Style::default().fg(Color::Yellow),
                tab_current: Style::default().fg(Color::Black).bg(Color::Cyan),
                tab_active: Style::default().fg(Color::Blue),
                tab_private: Style::default().fg(Color::Green),
                tab_highlight: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                tab_none: Style::default().fg(Color::Gray),
            }
        } else {
            // Without colors, keep modifiers so attention is still visible.
            let bold = Style::default().add_modifier(Modifier::BOLD);
            Self {
                time: Style::default(),
                nickname: bold,
                highlight: bold,
                action: Style::default(),
                info: Style::default(),
                error: Style::default(),
                corrected: Style::default(),
                tab_current: Style::default().add_modifier(Modifier::REVERSED),
                tab_active: Style::default(),
                tab_private: bold,
                tab_highlight: bold,
                tab_none: Style::default(),
            }
        }
    }

    /// Timestamp prefix.
    pub fn time(&self) -> Style {
        self.time
    }

    /// Author nickname.
    pub fn nickname(&self) -> Style {
        self.nickname
    }

    /// Marker of a corrected message.
    pub fn corrected(&self) -> Style {
        self.corrected
    }

    /// Style of a message body.
    pub fn style_for_line(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Normal => Style::default(),
            LineKind::Highlight => self.highlight,
            LineKind::Action => self.action,
            LineKind::Info => self.info,
            LineKind::Error => self.error,
        }
    }

    /// Style of a tab number in the tab bar.
    pub fn style_for_tab(&self, state: FocusState) -> Style {
        match state {
            FocusState::Current => self.tab_current,
            FocusState::Active => self.tab_active,
            FocusState::Private => self.tab_private,
            FocusState::Highlight => self.tab_highlight,
            FocusState::None => self.tab_none,
        }
    }
}

impl Default for ChatStyles {
    fn default() -> Self {
        Self::with_color_config(ColorConfig::default())
    }
}

// ===== Tests =====
