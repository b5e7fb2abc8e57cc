use rewind_types::UndoState;

/// Fresh checkpoint for a session with nothing undone yet.
///
/// `current_turn_index` points at the newest turn, or `-1` for an empty
/// session.
pub fn create_empty_undo_state(session_id: impl Into<String>, total_turns: usize) -> UndoState {
    UndoState {
        session_id: session_id.into(),
        current_turn_index: total_turns as i64 - 1,
        total_turns,
        branches: Vec::new(),
        active_branch_id: None,
    }
}
