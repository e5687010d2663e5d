//! Layout dimension constants for TUI rendering.
//!
//! Centralized location for all layout-related numeric values to enable
//! consistent tuning across the application.

/// Height of the tab bar in lines.
pub const TAB_BAR_HEIGHT: u16 = 1;

/// Height of the input line.
pub const INPUT_HEIGHT: u16 = 1;

/// Lines kept per text window before the oldest are dropped.
///
/// Independent of the message limit: one message can span many lines.
pub const MAX_WINDOW_LINES: usize = 4096;

/// Width given to a window before the first resize arrives.
pub const DEFAULT_WINDOW_WIDTH: u16 = 80;

/// Height given to a window before the first resize arrives.
pub const DEFAULT_WINDOW_HEIGHT: u16 = 20;
