//! Boundary between the client core and the protocol layer.
//!
//! The protocol layer may run on its own thread. It never touches tabs or
//! message logs: it pushes [`SessionEvent`]s into a channel which the event
//! loop drains once per iteration on its own thread.

pub mod loopback;

pub use loopback::LoopbackSession;

use crate::model::message::{AuthorIdentity, CorrelationId};
use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// A message received from a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Conversation name, a new tab is opened for unknown ones.
    pub conversation: String,
    /// Message body.
    pub text: String,
    /// Nickname of the author.
    pub nickname: Option<String>,
    /// Identity of the author.
    pub identity: Option<AuthorIdentity>,
    /// Session id of the message.
    pub correlation_id: Option<CorrelationId>,
    /// Id of the earlier message this one corrects.
    pub correction_of: Option<CorrelationId>,
    /// One-to-one chat rather than a room.
    pub direct: bool,
    /// Replayed from history rather than live.
    pub history: bool,
    /// Time sent, if not now.
    pub timestamp: Option<DateTime<Local>>,
}

impl InboundMessage {
    /// Message `text` in `conversation`.
    pub fn new(conversation: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation: conversation.into(),
            text: text.into(),
            nickname: None,
            identity: None,
            correlation_id: None,
            correction_of: None,
            direct: false,
            history: false,
            timestamp: None,
        }
    }

    /// Set the author nickname.
    pub fn from_nick(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Set the author identity.
    pub fn identity(mut self, identity: AuthorIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the session id.
    pub fn id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Mark as a correction of `old_id`.
    pub fn correcting(mut self, old_id: CorrelationId) -> Self {
        self.correction_of = Some(old_id);
        self
    }

    /// Mark as a one-to-one message.
    pub fn direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }

    /// Mark as a history replay.
    pub fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }
}

/// Everything the protocol layer reports to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A message, or a correction of one.
    Message(InboundMessage),
    /// Someone joined, left or changed status.
    Presence {
        /// Conversation the change happened in.
        conversation: String,
        /// Who changed.
        nickname: String,
        /// New status, free text.
        status: String,
    },
    /// The session is up.
    Connected,
    /// The session went down, with the reason.
    Disconnected(String),
}

/// Outgoing side of the protocol layer.
pub trait Session {
    /// Send `text` to a conversation. Returns the id given to the message.
    fn send(&mut self, conversation: &str, text: &str) -> Option<CorrelationId>;

    /// Send `text` as a correction of our earlier message `corrects`.
    fn send_correction(
        &mut self,
        conversation: &str,
        text: &str,
        corrects: &CorrelationId,
    ) -> Option<CorrelationId>;

    /// Identity attached to our own messages.
    fn own_identity(&self) -> Option<AuthorIdentity> {
        None
    }
}

/// Channel carrying session events to the event loop.
pub fn event_channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    unbounded()
}
