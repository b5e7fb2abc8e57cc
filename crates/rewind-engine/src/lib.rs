// Undo/redo engine - computes reversible file operations and the branch
// tree over parsed turns. Pure computation: operations are described for
// an external executor, never performed here.

mod branch;
mod operations;
mod reversible;
mod state;

pub use branch::{
    archive_turn, collect_child_branches, create_branch, split_child_branches, BranchPartition,
    BranchSplit,
};
pub use operations::{
    build_redo_from_archived, build_redo_operations, build_undo_operations, summarize_operations,
};
pub use reversible::extract_reversible_calls;
pub use state::create_empty_undo_state;
