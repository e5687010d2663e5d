//! Error types for chatmux.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level fatal errors (terminal setup, configuration, logging)
//! - [`CorrectionError`] - A message correction was refused by a [`MessageLog`]
//! - [`InvalidMove`] - A tab move or close request was out of range or a no-op
//! - [`CommandError`] - A command could not be resolved or its handler failed
//!
//! # Error Recovery Strategy
//!
//! Only [`AppError`] is fatal. Every other error is turned into a single-line
//! information message by the event loop and the session keeps running.
//!
//! [`MessageLog`]: crate::state::MessageLog

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::model::message::CorrelationId;
use thiserror::Error;

/// Top-level application error encompassing all fatal failure modes.
///
/// Returned from startup and from the main loop. Anything that reaches this
/// type terminates the program after the terminal has been restored.
#[derive(Debug, Error)]
pub enum AppError {
    /// Terminal or TUI rendering error.
    ///
    /// Raw mode, alternate screen, or drawing failed. Without a working
    /// terminal the client cannot function.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// The configuration file exists but could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Reasons a correction of an earlier message is refused.
///
/// Always recoverable: the caller reports it and may append the text as a
/// plain new message instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    /// No message in the log carries the correlation id being corrected.
    ///
    /// Either the id never existed or the message has already been evicted
    /// by the size limit.
    #[error("nothing to replace: no message with id {0}")]
    NotFound(CorrelationId),

    /// The message exists but was written by someone else.
    #[error("wrong author for message {0}")]
    WrongAuthor(CorrelationId),

    /// The message was a history replay; its ordering relative to the live
    /// session cannot be verified, so it cannot be corrected.
    #[error("delayed message {0} cannot be corrected")]
    DelayedMessage(CorrelationId),
}

/// A tab move or close request that was rejected without touching state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    /// Tab 0 is the permanent information tab and can never be moved or closed.
    #[error("tab 0 cannot be moved or closed")]
    PermanentTab,

    /// An index outside the movable range `[1, len)`.
    #[error("tab index {index} out of range (1..{len})")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the tab list at the time of the request.
        len: usize,
    },

    /// Source and destination are the same slot.
    #[error("tab is already at that position")]
    NoOp,

    /// The source slot holds a Gap, there is nothing to move.
    #[error("slot {0} is empty")]
    Placeholder(usize),
}

/// Errors raised while resolving or running a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No command (or alias) with that name is registered.
    #[error("Unknown command ({0})")]
    Unknown(String),

    /// The command was invoked with arguments it cannot use.
    #[error("Usage: /{name} {usage}")]
    Usage {
        /// Command name.
        name: String,
        /// Usage string as registered.
        usage: String,
    },

    /// The handler ran and failed.
    #[error("{0}")]
    Failed(String),

    /// Each command may carry at most one alias.
    #[error("cannot alias {alias}: /{target} already has an alias")]
    AliasTaken {
        /// Alias that was requested.
        alias: String,
        /// Command that already has an alias.
        target: String,
    },

    /// A tab was designated by a name or number that does not exist.
    #[error("Tab {0} does not exist")]
    NoSuchTab(String),
}

impl From<InvalidMove> for CommandError {
    fn from(err: InvalidMove) -> Self {
        CommandError::Failed(format!("Unable to move the tab: {err}"))
    }
}

impl From<CorrectionError> for CommandError {
    fn from(err: CorrectionError) -> Self {
        CommandError::Failed(format!("Unable to correct: {err}"))
    }
}
