//! Conversation message model.
//!
//! A [`Message`] is immutable once built. Corrections never edit a message in
//! place: they build a new one that owns the old one as its
//! `previous_revision`, so a revision chain is acyclic by construction and is
//! dropped as a whole when the head is evicted.

use chrono::{DateTime, Local};
use std::fmt;

/// Marker that turns a message into an action ("/me waves").
pub const ACTION_PREFIX: &str = "/me ";

/// Short time format used for live messages.
const LIVE_TIME_FORMAT: &str = "%H:%M:%S";

/// Long time format used for history replays.
const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Externally supplied message identifier (e.g. a protocol message id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap a session-specific id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle identifying who wrote a message.
///
/// Only compared for equality when checking correction ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorIdentity(String);

impl AuthorIdentity {
    /// Wrap a session-specific author identity.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pre-formatted timestamp shown next to a message.
///
/// Live messages use the short `HH:MM:SS` form, history replays the long
/// dated form. The long form is what marks a message as delayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTime(String);

impl DisplayTime {
    /// Format `time` for a live or a history message.
    pub fn format(time: &DateTime<Local>, history: bool) -> Self {
        let pattern = if history {
            HISTORY_TIME_FORMAT
        } else {
            LIVE_TIME_FORMAT
        };
        Self(time.format(pattern).to_string())
    }

    /// True when the long, dated form was used (history replay).
    pub fn is_long_form(&self) -> bool {
        self.0.len() > "HH:MM:SS".len()
    }

    /// Formatted time.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything the caller supplies when adding a message to a log.
///
/// Built with [`NewMessage::new`] and the chained setters; unset optional
/// fields default to "none"/`false` and the timestamp to now.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    /// Message body, `/me ` prefix included.
    pub text: String,
    /// Defaults to now.
    pub timestamp: Option<DateTime<Local>>,
    /// Nickname shown before the text.
    pub author_nickname: Option<String>,
    /// Who is allowed to correct the message.
    pub author_identity: Option<AuthorIdentity>,
    /// Session id, needed to correct the message later.
    pub correlation_id: Option<CorrelationId>,
    /// Mentions our nickname.
    pub highlighted: bool,
    /// Replayed from history rather than received live.
    pub history: bool,
}

impl NewMessage {
    /// Start a message with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: None,
            author_nickname: None,
            author_identity: None,
            correlation_id: None,
            highlighted: false,
            history: false,
        }
    }

    /// Set the shown nickname.
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.author_nickname = Some(nickname.into());
        self
    }

    /// Set the author identity.
    pub fn identity(mut self, identity: AuthorIdentity) -> Self {
        self.author_identity = Some(identity);
        self
    }

    /// Set the session id.
    pub fn correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Set the time instead of now.
    pub fn timestamp(mut self, time: DateTime<Local>) -> Self {
        self.timestamp = Some(time);
        self
    }

    /// Mark as mentioning us.
    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }

    /// Mark the message as a history replay (long-form display time).
    pub fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }
}

/// One unit of conversation content.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    text: String,
    timestamp: DateTime<Local>,
    display_time: DisplayTime,
    author_nickname: Option<String>,
    author_identity: Option<AuthorIdentity>,
    correlation_id: Option<CorrelationId>,
    is_highlighted: bool,
    is_action: bool,
    revision_count: u32,
    previous_revision: Option<Box<Message>>,
}

impl Message {
    /// Build a first revision from caller-supplied fields.
    ///
    /// A leading `"/me "` sets `is_action` and is stripped; tabs are expanded
    /// to four spaces.
    pub fn build(new: NewMessage) -> Self {
        let timestamp = new.timestamp.unwrap_or_else(Local::now);
        let (text, is_action) = split_action(&new.text);
        Self {
            text,
            display_time: DisplayTime::format(&timestamp, new.history),
            timestamp,
            author_nickname: new.author_nickname,
            author_identity: new.author_identity,
            correlation_id: new.correlation_id,
            is_highlighted: new.highlighted,
            is_action,
            revision_count: 0,
            previous_revision: None,
        }
    }

    /// Build the next revision of `previous`.
    ///
    /// Keeps the author of the original; the new text gets a fresh action
    /// check and a live display time.
    pub fn revise(
        previous: Message,
        text: &str,
        new_id: CorrelationId,
        timestamp: Option<DateTime<Local>>,
        highlighted: bool,
    ) -> Self {
        let timestamp = timestamp.unwrap_or(previous.timestamp);
        let (text, is_action) = split_action(text);
        Self {
            text,
            display_time: DisplayTime::format(&timestamp, false),
            timestamp,
            author_nickname: previous.author_nickname.clone(),
            author_identity: previous.author_identity.clone(),
            correlation_id: Some(new_id),
            is_highlighted: highlighted,
            is_action,
            revision_count: previous.revision_count + 1,
            previous_revision: Some(Box::new(previous)),
        }
    }

    /// Body, without the `/me ` prefix of actions.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When this revision was written.
    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    /// Time as shown.
    pub fn display_time(&self) -> &DisplayTime {
        &self.display_time
    }

    /// Nickname shown before the text.
    pub fn author_nickname(&self) -> Option<&str> {
        self.author_nickname.as_deref()
    }

    /// Identity allowed to correct this message.
    pub fn author_identity(&self) -> Option<&AuthorIdentity> {
        self.author_identity.as_ref()
    }

    /// Session id of this revision.
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Mentions our nickname.
    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted
    }

    /// Written as `/me `.
    pub fn is_action(&self) -> bool {
        self.is_action
    }

    /// Number of earlier revisions.
    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    /// The revision this one replaced.
    pub fn previous_revision(&self) -> Option<&Message> {
        self.previous_revision.as_deref()
    }

    /// Iterate the revision chain, newest first, starting with `self`.
    pub fn revisions(&self) -> impl Iterator<Item = &Message> {
        std::iter::successors(Some(self), |m| m.previous_revision())
    }
}

fn split_action(raw: &str) -> (String, bool) {
    let expanded = raw.replace('\t', "    ");
    match expanded.strip_prefix(ACTION_PREFIX) {
        Some(rest) => (rest.to_string(), true),
        None => (expanded, false),
    }
}
