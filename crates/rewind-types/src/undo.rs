use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file-system side effect described for an external executor.
///
/// Undo-direction variants (`reverse-edit`, `delete-write`) invert what a
/// turn did; redo-direction variants (`apply-edit`, `create-write`) replay
/// it. The engine only describes operations, it never touches the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum FileOperation {
    ReverseEdit {
        file_path: String,
        /// The edit's `new_string`: what is currently in the file.
        old_string: String,
        /// The edit's `old_string`: what to restore.
        new_string: String,
        replace_all: bool,
        turn_index: usize,
    },
    DeleteWrite {
        file_path: String,
        content: String,
        turn_index: usize,
    },
    ApplyEdit {
        file_path: String,
        old_string: String,
        new_string: String,
        replace_all: bool,
        turn_index: usize,
    },
    CreateWrite {
        file_path: String,
        content: String,
        turn_index: usize,
    },
}

impl FileOperation {
    pub fn file_path(&self) -> &str {
        match self {
            FileOperation::ReverseEdit { file_path, .. } => file_path,
            FileOperation::DeleteWrite { file_path, .. } => file_path,
            FileOperation::ApplyEdit { file_path, .. } => file_path,
            FileOperation::CreateWrite { file_path, .. } => file_path,
        }
    }

    pub fn turn_index(&self) -> usize {
        match self {
            FileOperation::ReverseEdit { turn_index, .. } => *turn_index,
            FileOperation::DeleteWrite { turn_index, .. } => *turn_index,
            FileOperation::ApplyEdit { turn_index, .. } => *turn_index,
            FileOperation::CreateWrite { turn_index, .. } => *turn_index,
        }
    }
}

/// A tool call reduced to its reversible essence: a non-error Edit or
/// Write with a resolvable file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReversibleCall {
    Edit {
        file_path: String,
        old_string: String,
        new_string: String,
        replace_all: bool,
    },
    Write {
        file_path: String,
        content: String,
    },
}

impl ReversibleCall {
    pub fn file_path(&self) -> &str {
        match self {
            ReversibleCall::Edit { file_path, .. } => file_path,
            ReversibleCall::Write { file_path, .. } => file_path,
        }
    }
}

/// A turn reduced to what is needed to display and replay it once it is no
/// longer part of the live suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTurn {
    /// The turn's index in the session it was archived from.
    pub index: usize,
    pub user_message: Option<String>,
    pub tool_calls: Vec<ReversibleCall>,
    pub thinking_blocks: Vec<String>,
    pub assistant_text: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub model: Option<String>,
}

/// An archived alternate future of the conversation.
///
/// Branches form a tree: a branch may itself have been branched from,
/// producing nested `child_branches`. The raw JSONL lines are retained so
/// the archived turns can be reconstructed verbatim on redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Index of the last turn still live when this branch was archived.
    /// `-1` when the whole session was undone.
    pub branch_point_turn_index: i64,
    pub label: String,
    pub turns: Vec<ArchivedTurn>,
    pub jsonl_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_branches: Vec<Branch>,
}

/// The persisted per-session checkpoint a caller stores between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoState {
    pub session_id: String,
    /// Index of the newest turn still applied; `-1` when everything has
    /// been undone. `total_turns - 1` initially.
    pub current_turn_index: i64,
    pub total_turns: usize,
    pub branches: Vec<Branch>,
    pub active_branch_id: Option<String>,
}

/// Pre-confirmation impact summary for a list of file operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub turn_count: usize,
    pub file_count: usize,
    pub file_paths: Vec<String>,
    pub operation_count: usize,
}
