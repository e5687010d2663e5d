//! Client state: tabs, logs, timers, key routing and the loop driving them.
//!
//! Everything here runs without a terminal. The view layer only reads it.

pub mod builtins;
pub mod commands;
pub mod core;
pub mod event_loop;
pub mod info_buffer;
pub mod input_line;
pub mod key_router;
pub mod message_log;
pub mod tab_list;
pub mod timed_events;

// Re-export for convenience
pub use commands::{Command, CommandRegistry};
pub use self::core::{Core, LoopState};
pub use event_loop::{Display, EventLoop, KeySource, Step};
pub use info_buffer::InfoBuffer;
pub use input_line::{InputLine, InputOutcome};
pub use key_router::{ActionTable, Dispatch, KeyRouter};
pub use message_log::{MessageLog, MessageView};
pub use tab_list::{Direction, TabSlotList};
pub use timed_events::{TimedEventId, TimedEventQueue};
