//! Incremental append parsing.
//!
//! New log lines normally only affect the last turn (a pending tool
//! result, or an assistant stream still going), so the rebuild point is
//! that turn's first raw record. A late sub-agent progress record whose
//! parent tool call lives in an earlier turn rolls the rebuild point back
//! to that turn. Turns before the rebuild point are reused as-is.

use rewind_types::{ParsedSession, RawMessage, Turn};

use crate::builder::{SessionBuilder, SessionMeta};

/// Apply newly appended log text to an already-parsed session.
///
/// Returns `existing` unchanged when the new text holds no decodable
/// records. Never mutates `existing` observably otherwise: all rebuilt
/// turns are fresh values.
pub fn parse_session_append(existing: ParsedSession, new_text: &str) -> ParsedSession {
    let new_records: Vec<RawMessage> = new_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    if new_records.is_empty() {
        return existing;
    }

    let rebuild_idx = rebuild_point(&existing.turns, &new_records);

    let kept: Vec<Turn> = existing.turns[..rebuild_idx].to_vec();
    let replay_from = existing
        .turns
        .get(rebuild_idx)
        .map(|t| t.raw_start)
        .unwrap_or(0);
    let pending_summary = existing
        .turns
        .get(rebuild_idx)
        .and_then(|t| t.compaction_summary.clone());

    let mut builder = SessionBuilder::resume(
        SessionMeta::from_session(&existing),
        kept,
        replay_from,
        pending_summary,
    );

    let mut raw_messages = existing.raw_messages;
    for raw in &raw_messages[replay_from..] {
        builder.ingest(raw);
    }
    for raw in new_records {
        builder.ingest(&raw);
        raw_messages.push(raw);
    }

    builder.into_session(raw_messages)
}

/// The earliest turn index the new records could affect.
fn rebuild_point(turns: &[Turn], new_records: &[RawMessage]) -> usize {
    if turns.is_empty() {
        return 0;
    }
    let mut rebuild_idx = turns.len() - 1;

    for record in new_records {
        if let RawMessage::Progress(prog) = record
            && let Some(parent_id) = &prog.parent_tool_use_id
            && let Some(owner) = turn_owning_tool_call(turns, parent_id)
            && owner < rebuild_idx
        {
            rebuild_idx = owner;
        }
    }

    rebuild_idx
}

fn turn_owning_tool_call(turns: &[Turn], tool_use_id: &str) -> Option<usize> {
    turns
        .iter()
        .position(|turn| turn.tool_calls.iter().any(|c| c.id == tool_use_id))
}
