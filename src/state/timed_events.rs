//! Deadline callbacks serviced while input is idle.
//!
//! The queue never reschedules anything by itself. A firing callback gets
//! mutable access to its own deadline and returns whether it stays pending:
//! `false` removes it, `true` keeps it, and if the deadline was not pushed
//! forward it simply fires again on the next check.

use std::time::{Duration, Instant};
use tracing::debug;

/// Longest delay [`TimedEventQueue::add_delayed`] schedules.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Callback type; receives the context and its own deadline.
pub type TimedCallback<C> = Box<dyn FnMut(&mut C, &mut Instant) -> bool>;

/// Handle used to cancel an event before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimedEventId(u64);

/// A pending deadline callback.
pub struct TimedEvent<C> {
    id: TimedEventId,
    deadline: Instant,
    callback: TimedCallback<C>,
}

impl<C> TimedEvent<C> {
    /// Handle for cancelling this event.
    pub fn id(&self) -> TimedEventId {
        self.id
    }

    /// When the event becomes due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the event is due at `now`.
    pub fn has_timed_out(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

impl<C> std::fmt::Debug for TimedEvent<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedEvent")
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Process-wide set of pending timed events.
pub struct TimedEventQueue<C> {
    events: Vec<TimedEvent<C>>,
    next_id: u64,
}

impl<C> Default for TimedEventQueue<C> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> std::fmt::Debug for TimedEventQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.events.iter()).finish()
    }
}

impl<C> TimedEventQueue<C> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback firing at `deadline`.
    pub fn add<F>(&mut self, deadline: Instant, callback: F) -> TimedEventId
    where
        F: FnMut(&mut C, &mut Instant) -> bool + 'static,
    {
        let id = TimedEventId(self.next_id);
        self.next_id += 1;
        self.events.push(TimedEvent {
            id,
            deadline,
            callback: Box::new(callback),
        });
        id
    }

    /// Register a callback firing once after `delay`.
    ///
    /// A delay too large to represent is capped at [`MAX_DELAY`].
    pub fn add_delayed<F>(&mut self, delay: Duration, mut callback: F) -> TimedEventId
    where
        F: FnMut(&mut C) + 'static,
    {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay.min(MAX_DELAY))
            .unwrap_or(now);
        self.add(deadline, move |ctx, _| {
            callback(ctx);
            false
        })
    }

    /// Remove an event before it fires. Returns whether it was pending.
    pub fn remove(&mut self, id: TimedEventId) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        before != self.events.len()
    }

    /// Whether `id` is still pending.
    pub fn contains(&self, id: TimedEventId) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.events.iter().map(|e| e.deadline).min()
    }

    /// Ids of the events due at `now`, in registration order.
    pub fn expired(&self, now: Instant) -> Vec<TimedEventId> {
        self.events
            .iter()
            .filter(|e| e.has_timed_out(now))
            .map(|e| e.id)
            .collect()
    }

    fn take(&mut self, id: TimedEventId) -> Option<TimedEvent<C>> {
        let index = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(index))
    }
}

/// Fire every event due at `now` in the queue that `queue` finds inside
/// `ctx`. Returns the number of callbacks run.
///
/// Each event is taken out of the live queue only while its own callback
/// runs, so callbacks can add events and cancel ones not yet fired. An
/// event added during the check waits for the next one.
pub fn fire_expired<C, Q>(ctx: &mut C, queue: Q, now: Instant) -> usize
where
    Q: Fn(&mut C) -> &mut TimedEventQueue<C>,
{
    let mut fired = 0;
    for id in queue(ctx).expired(now) {
        // cancelled by an earlier callback
        let Some(mut event) = queue(ctx).take(id) else {
            continue;
        };
        fired += 1;
        if (event.callback)(ctx, &mut event.deadline) {
            queue(ctx).events.push(event);
        } else {
            debug!(id = ?event.id, "Timed event done");
        }
    }
    fired
}
