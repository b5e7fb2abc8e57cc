// Parser layer - turns the append-only JSONL log into a structured session
// and keeps it updated as new lines arrive.

mod append;
mod builder;
pub mod error;
mod parser;
mod pending;
mod thinking;

pub use append::parse_session_append;
pub use error::{Error, Result};
pub use parser::{parse_raw_message, parse_session};
pub use pending::{detect_pending_interaction, PendingInteraction};
