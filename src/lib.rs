//! chatmux
//!
//! Terminal chat client core: numbered tabs, message logs with corrections,
//! timed events and a configurable key router.
//!
//! State lives in [`state`] and is testable without a terminal; [`view`] is
//! the impure shell drawing it with ratatui.

pub mod config;
pub mod logging;
pub mod model;
pub mod session;
pub mod state;
pub mod tabs;
pub mod view;
