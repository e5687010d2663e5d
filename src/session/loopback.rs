//! Session with no network: ids are counted locally and messages sent to
//! the echo conversation come straight back.

use super::{InboundMessage, Session, SessionEvent};
use crate::model::message::{AuthorIdentity, CorrelationId};
use crossbeam_channel::Sender;
use tracing::{debug, warn};

/// Conversation whose messages are echoed back.
pub const ECHO_CONVERSATION: &str = "echo";

/// Nickname the echoed messages come from.
pub const ECHO_NICK: &str = "echo";

/// Local session that answers in the `echo` conversation.
#[derive(Debug)]
pub struct LoopbackSession {
    events: Sender<SessionEvent>,
    identity: AuthorIdentity,
    sent: u64,
}

impl LoopbackSession {
    /// Session reporting to `events` as `own_nick`.
    pub fn new(events: Sender<SessionEvent>, own_nick: &str) -> Self {
        Self {
            events,
            identity: AuthorIdentity::new(format!("{own_nick}@loopback")),
            sent: 0,
        }
    }

    /// Report a successful connection.
    pub fn connect(&self) {
        self.emit(SessionEvent::Connected);
    }

    /// Messages and corrections sent so far.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    fn next_id(&mut self) -> CorrelationId {
        self.sent += 1;
        CorrelationId::new(format!("local-{}", self.sent))
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event dropped: event loop is gone");
        }
    }

    fn echo_id(id: &CorrelationId) -> CorrelationId {
        CorrelationId::new(format!("echo-{id}"))
    }
}

impl Session for LoopbackSession {
    fn send(&mut self, conversation: &str, text: &str) -> Option<CorrelationId> {
        let id = self.next_id();
        debug!(conversation, %id, "Sending message");
        if conversation == ECHO_CONVERSATION {
            self.emit(SessionEvent::Message(
                InboundMessage::new(conversation, text)
                    .from_nick(ECHO_NICK)
                    .id(Self::echo_id(&id))
                    .direct(true),
            ));
        }
        Some(id)
    }

    fn send_correction(
        &mut self,
        conversation: &str,
        text: &str,
        corrects: &CorrelationId,
    ) -> Option<CorrelationId> {
        let id = self.next_id();
        debug!(conversation, %id, %corrects, "Sending correction");
        if conversation == ECHO_CONVERSATION {
            self.emit(SessionEvent::Message(
                InboundMessage::new(conversation, text)
                    .from_nick(ECHO_NICK)
                    .id(Self::echo_id(&id))
                    .correcting(Self::echo_id(corrects))
                    .direct(true),
            ));
        }
        Some(id)
    }

    fn own_identity(&self) -> Option<AuthorIdentity> {
        Some(self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::event_channel;

    #[test]
    fn ids_are_unique_and_local() {
        let (tx, _rx) = event_channel();
        let mut session = LoopbackSession::new(tx, "me");
        let a = session.send("room", "hi");
        let b = session.send("room", "there");
        assert_eq!(a, Some(CorrelationId::new("local-1")));
        assert_ne!(a, b);
        assert_eq!(session.sent_count(), 2);
    }

    #[test]
    fn only_echo_conversation_is_echoed() {
        let (tx, rx) = event_channel();
        let mut session = LoopbackSession::new(tx, "me");
        session.send("room", "hi");
        assert!(rx.try_recv().is_err());
        session.send(ECHO_CONVERSATION, "ping");
        match rx.try_recv() {
            Ok(SessionEvent::Message(msg)) => {
                assert_eq!(msg.text, "ping");
                assert_eq!(msg.nickname.as_deref(), Some(ECHO_NICK));
                assert!(msg.direct);
            }
            other => panic!("expected echoed message, got {other:?}"),
        }
    }

    #[test]
    fn echoed_correction_points_at_echoed_original() {
        let (tx, rx) = event_channel();
        let mut session = LoopbackSession::new(tx, "me");
        let first = session
            .send(ECHO_CONVERSATION, "helo")
            .expect("loopback always assigns ids");
        let original = match rx.try_recv() {
            Ok(SessionEvent::Message(msg)) => msg.correlation_id,
            other => panic!("expected echo, got {other:?}"),
        };
        session.send_correction(ECHO_CONVERSATION, "hello", &first);
        match rx.try_recv() {
            Ok(SessionEvent::Message(msg)) => assert_eq!(msg.correction_of, original),
            other => panic!("expected echoed correction, got {other:?}"),
        }
    }

    #[test]
    fn send_after_loop_is_gone_does_not_panic() {
        let (tx, rx) = event_channel();
        drop(rx);
        let mut session = LoopbackSession::new(tx, "me");
        assert!(session.send(ECHO_CONVERSATION, "x").is_some());
    }
}
