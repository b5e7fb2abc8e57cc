pub mod pricing;
pub mod raw;
pub mod session;
pub mod undo;
mod util;

pub use pricing::{
    calculate_cost, calculate_sub_agent_cost_estimated, calculate_turn_cost_estimated,
    estimate_sub_agent_output_tokens, estimate_total_output_tokens, format_cost, CostParams,
};
pub use raw::{
    AssistantMessage, AssistantRecord, BranchOrigin, ContentPart, ProgressMessage, ProgressRecord,
    RawMessage, RawTokenUsage, RecordMeta, ServerToolUse, SystemRecord, UserMessage, UserRecord,
};
pub use session::{
    ContentBlock, ParsedSession, SessionStats, SubAgentMessage, TokenTotals, ToolCall, Turn,
};
pub use undo::{
    ArchivedTurn, Branch, FileOperation, OperationSummary, ReversibleCall, UndoState,
};
pub use util::truncate_chars;
