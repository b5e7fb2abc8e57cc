use rewind_types::{ParsedSession, RawMessage};

use crate::builder::SessionBuilder;
use crate::Result;

/// Decode one log line. Callers that stream lines themselves can use this
/// to pre-validate before feeding an append batch.
pub fn parse_raw_message(line: &str) -> Result<RawMessage> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Parse a whole session log.
///
/// Blank lines and lines that fail JSON decoding are skipped, never fatal.
/// Decoded records are retained in `ParsedSession::raw_messages` so that
/// `parse_session_append` can replay a suffix later.
pub fn parse_session(text: &str) -> ParsedSession {
    let mut builder = SessionBuilder::new();
    let mut raw_messages = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(raw) = serde_json::from_str::<RawMessage>(line) else {
            continue;
        };
        builder.ingest(&raw);
        raw_messages.push(raw);
    }

    builder.into_session(raw_messages)
}
