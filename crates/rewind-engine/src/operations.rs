use std::collections::BTreeSet;

use rewind_types::{ArchivedTurn, FileOperation, OperationSummary, ReversibleCall, Turn};

use crate::reversible::extract_reversible_calls;

/// Undo operations for the turn range `(to, from]`, newest turn first.
///
/// Within a turn, calls are reversed in call order — the last call is
/// undone first, since later edits in a turn may depend on earlier ones.
/// Returns an empty list when `from == to`.
pub fn build_undo_operations(turns: &[Turn], from: i64, to: i64) -> Vec<FileOperation> {
    let mut ops = Vec::new();
    let mut idx = from;
    while idx > to {
        if idx >= 0
            && let Some(turn) = turns.get(idx as usize)
        {
            for call in extract_reversible_calls(turn).into_iter().rev() {
                ops.push(undo_operation(call, idx as usize));
            }
        }
        idx -= 1;
    }
    ops
}

/// Redo operations for the turn range `(from, to]`, oldest turn first,
/// calls in their original order.
pub fn build_redo_operations(turns: &[Turn], from: i64, to: i64) -> Vec<FileOperation> {
    let mut ops = Vec::new();
    let mut idx = from + 1;
    while idx <= to {
        if idx >= 0
            && let Some(turn) = turns.get(idx as usize)
        {
            for call in extract_reversible_calls(turn) {
                ops.push(redo_operation(call, idx as usize));
            }
        }
        idx += 1;
    }
    ops
}

/// Redo operations from archived turns, optionally capped at a position
/// in the archive for a partial redo (`up_to_index` is inclusive).
pub fn build_redo_from_archived(
    archived: &[ArchivedTurn],
    up_to_index: Option<usize>,
) -> Vec<FileOperation> {
    let limit = up_to_index
        .map(|cap| (cap + 1).min(archived.len()))
        .unwrap_or(archived.len());

    archived[..limit]
        .iter()
        .flat_map(|turn| {
            turn.tool_calls
                .iter()
                .map(|call| redo_operation(call.clone(), turn.index))
        })
        .collect()
}

fn undo_operation(call: ReversibleCall, turn_index: usize) -> FileOperation {
    match call {
        ReversibleCall::Edit {
            file_path,
            old_string,
            new_string,
            replace_all,
        } => FileOperation::ReverseEdit {
            file_path,
            // Swapped: the file currently holds new_string.
            old_string: new_string,
            new_string: old_string,
            replace_all,
            turn_index,
        },
        ReversibleCall::Write { file_path, content } => FileOperation::DeleteWrite {
            file_path,
            content,
            turn_index,
        },
    }
}

fn redo_operation(call: ReversibleCall, turn_index: usize) -> FileOperation {
    match call {
        ReversibleCall::Edit {
            file_path,
            old_string,
            new_string,
            replace_all,
        } => FileOperation::ApplyEdit {
            file_path,
            old_string,
            new_string,
            replace_all,
            turn_index,
        },
        ReversibleCall::Write { file_path, content } => FileOperation::CreateWrite {
            file_path,
            content,
            turn_index,
        },
    }
}

/// Impact summary presented to the caller before it executes a list of
/// operations.
pub fn summarize_operations(ops: &[FileOperation]) -> OperationSummary {
    let turn_indices: BTreeSet<usize> = ops.iter().map(|op| op.turn_index()).collect();

    let mut file_paths: Vec<String> = Vec::new();
    for op in ops {
        let path = op.file_path();
        if !file_paths.iter().any(|p| p == path) {
            file_paths.push(path.to_string());
        }
    }

    OperationSummary {
        turn_count: turn_indices.len(),
        file_count: file_paths.len(),
        file_paths,
        operation_count: ops.len(),
    }
}
