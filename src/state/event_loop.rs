//! The main loop: read keys, run timers, apply session events, redraw.
//!
//! Input and output sit behind [`KeySource`] and [`Display`] so the loop
//! runs the same against a terminal or a scripted test double.

use super::core::Core;
use crate::model::key::RESIZE_KEY;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Where key batches come from.
pub trait KeySource {
    /// Wait up to `timeout` for input. `Ok(None)` means the wait timed out.
    ///
    /// A batch holds every key available in one read, in order.
    fn read_keys(&mut self, timeout: Duration) -> io::Result<Option<Vec<String>>>;
}

/// Where the core is drawn.
pub trait Display {
    /// Redraw the whole screen from `core`.
    fn draw(&mut self, core: &mut Core) -> io::Result<()>;

    /// Current size as `(width, height)`.
    fn size(&self) -> io::Result<(u16, u16)>;
}

/// What one iteration of the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A key batch was handled and the screen redrawn.
    Keys,
    /// The read timed out; `fired` timed events ran.
    Idle {
        /// Timed events that ran.
        fired: usize,
        /// Whether the screen was redrawn.
        redrawn: bool,
    },
    /// The core asked to stop.
    Stopped,
}

/// Drives a [`Core`] from a key source to a display.
pub struct EventLoop<K, D> {
    keys: K,
    display: D,
}

impl<K: KeySource, D: Display> EventLoop<K, D> {
    /// Loop reading from `keys` and drawing to `display`.
    pub fn new(keys: K, display: D) -> Self {
        Self { keys, display }
    }

    /// The display being drawn.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The display being drawn, mutably.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Size the core to the display and draw the first frame.
    pub fn start(&mut self, core: &mut Core) -> io::Result<()> {
        let (width, height) = self.display.size()?;
        core.resize(width, height);
        core.drain_session_events();
        self.display.draw(core)
    }

    /// Run until the core stops.
    pub fn run(&mut self, core: &mut Core) -> io::Result<()> {
        self.start(core)?;
        while self.step(core)? != Step::Stopped {}
        debug!("Event loop stopped");
        Ok(())
    }

    /// Wait for one key batch (or a timeout) and handle it.
    pub fn step(&mut self, core: &mut Core) -> io::Result<Step> {
        if !core.is_running() {
            return Ok(Step::Stopped);
        }
        let timeout = read_timeout(core, Instant::now());
        let batch = self.keys.read_keys(timeout)?;

        let step = match batch {
            Some(keys) => {
                trace!(count = keys.len(), "Key batch");
                if keys.iter().any(|k| k == RESIZE_KEY) {
                    let (width, height) = self.display.size()?;
                    core.set_screen_size(width, height);
                }
                core.feed_keys(&keys);
                // a busy keyboard must not starve the timers
                core.check_timed_events(Instant::now());
                core.drain_session_events();
                self.display.draw(core)?;
                Step::Keys
            }
            None => {
                let fired = core.check_timed_events(Instant::now());
                let handled = core.drain_session_events();
                let redrawn = fired > 0 || handled > 0;
                if redrawn {
                    self.display.draw(core)?;
                }
                Step::Idle { fired, redrawn }
            }
        };
        if core.is_running() {
            Ok(step)
        } else {
            Ok(Step::Stopped)
        }
    }
}

/// Configured input timeout, cut short by the next timed event.
fn read_timeout(core: &Core, now: Instant) -> Duration {
    let configured = Duration::from_millis(core.config().input_timeout_ms);
    match core.timed_events().next_deadline() {
        Some(deadline) => configured.min(deadline.saturating_duration_since(now)),
        None => configured,
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;
