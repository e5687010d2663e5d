//! Domain model types (pure).
//!
//! Messages, key names and the error taxonomy. No I/O happens here.

pub mod error;
pub mod key;
pub mod message;

// Re-export for convenience
pub use error::{AppError, CommandError, CorrectionError, InvalidMove};
pub use key::KeyToken;
pub use message::{AuthorIdentity, CorrelationId, DisplayTime, Message, NewMessage};
