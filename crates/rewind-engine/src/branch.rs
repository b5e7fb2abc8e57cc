use chrono::Utc;
use rewind_types::{truncate_chars, ArchivedTurn, Branch, Turn};
use uuid::Uuid;

use crate::reversible::extract_reversible_calls;

const LABEL_MAX_CHARS: usize = 60;
const UNTITLED_LABEL: &str = "Untitled branch";

/// Reduce a turn to its replayable essence for archival.
pub fn archive_turn(turn: &Turn, index: usize) -> ArchivedTurn {
    ArchivedTurn {
        index,
        user_message: turn.user_message.clone(),
        tool_calls: extract_reversible_calls(turn),
        thinking_blocks: turn.thinking.clone(),
        assistant_text: turn.assistant_text.clone(),
        timestamp: turn.timestamp,
        model: turn.model.clone(),
    }
}

/// Archive every turn after `branch_point_index` into a new branch.
///
/// The raw JSONL lines for the archived range ride along so the turns can
/// be reconstructed verbatim on restore; `child_branches` carries any
/// branches that were already hanging off the archived range.
pub fn create_branch(
    turns: &[Turn],
    branch_point_index: i64,
    jsonl_lines: Vec<String>,
    child_branches: Vec<Branch>,
) -> Branch {
    let first_archived = (branch_point_index + 1).max(0) as usize;
    let archived: Vec<ArchivedTurn> = turns
        .iter()
        .enumerate()
        .skip(first_archived)
        .map(|(index, turn)| archive_turn(turn, index))
        .collect();

    let label = archived
        .first()
        .and_then(|turn| turn.user_message.as_deref())
        .map(|msg| truncate_chars(msg, LABEL_MAX_CHARS))
        .unwrap_or_else(|| UNTITLED_LABEL.to_string());

    Branch {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
        branch_point_turn_index: branch_point_index,
        label,
        turns: archived,
        jsonl_lines,
        child_branches,
    }
}

/// Partition of existing branches around an undo cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPartition {
    /// Branch point still within the live suffix; stays where it is.
    pub retained: Vec<Branch>,
    /// Anchored past the cutoff; must be nested under the new archive.
    pub scooped: Vec<Branch>,
}

/// Partition branches around `cutoff_index`: branches anchored at or
/// before the cutoff remain valid, branches anchored after it are being
/// cut off along with their anchor turns.
pub fn collect_child_branches(branches: Vec<Branch>, cutoff_index: i64) -> BranchPartition {
    let (retained, scooped) = branches
        .into_iter()
        .partition(|b| b.branch_point_turn_index <= cutoff_index);
    BranchPartition { retained, scooped }
}

/// Split of a restored branch's children after a partial redo.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSplit {
    /// The redo reached their anchor turns; they rejoin the live set.
    pub restored: Vec<Branch>,
    /// Still archived; the redo stopped short of them.
    pub remaining: Vec<Branch>,
}

/// For a partial redo of `redo_turn_count` turns past `parent_branch_point`,
/// split child branches into those whose anchors were restored and those
/// still out of reach.
pub fn split_child_branches(
    child_branches: Vec<Branch>,
    parent_branch_point: i64,
    redo_turn_count: usize,
) -> BranchSplit {
    let max_valid_index = parent_branch_point + redo_turn_count as i64;
    let (restored, remaining) = child_branches
        .into_iter()
        .partition(|b| b.branch_point_turn_index <= max_valid_index);
    BranchSplit {
        restored,
        remaining,
    }
}
