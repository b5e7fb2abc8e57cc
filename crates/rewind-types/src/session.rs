use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::raw::{BranchOrigin, RawMessage};

/// Token totals accumulated per turn, per sub-agent message, and per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub web_search_requests: u32,
}

impl TokenTotals {
    pub fn add(&mut self, other: &TokenTotals) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
        self.web_search_requests += other.web_search_requests;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}

/// One tool invocation inside a turn (or a sub-agent's stream).
///
/// `result` stays `None` until the matching `tool_result` record arrives;
/// identity is the tool-use id, unique within the stream that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
    pub result: Option<String>,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl ToolCall {
    /// Resolve the file path argument (`file_path`, falling back to `path`).
    pub fn file_path(&self) -> Option<&str> {
        self.input
            .get("file_path")
            .or_else(|| self.input.get("path"))
            .and_then(|v| v.as_str())
    }
}

/// Ordered, kind-tagged content of a turn.
///
/// Adjacent blocks of the same kind emitted across multiple raw assistant
/// messages are merged, so no two adjacent blocks in a turn share a kind.
/// Tool-call and sub-agent blocks hold indices into the owning turn's
/// `tool_calls` / `sub_agent_activity` vectors: a late tool result then
/// resolves in exactly one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Thinking { entries: Vec<String> },
    Text { chunks: Vec<String> },
    ToolCalls { calls: Vec<usize> },
    SubAgent { messages: Vec<usize> },
}

impl ContentBlock {
    pub fn same_kind(&self, other: &ContentBlock) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// One batch of progress from a nested agent invocation.
///
/// Accumulates until a natural break in the sub-agent's stream, then is
/// flushed into the owning turn's `sub_agent_activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAgentMessage {
    pub agent_id: String,
    /// Read from the parent `Task` tool call's input; attached to the
    /// first flushed message for the agent.
    pub agent_name: Option<String>,
    pub subagent_type: Option<String>,
    pub thinking: Vec<String>,
    pub text: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    pub token_usage: TokenTotals,
    pub model: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The unit of conversation: one optional user message followed by every
/// assistant response up to (but not including) the next non-meta user
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// `None` for a synthetic turn whose first event is an assistant message.
    pub user_message: Option<String>,
    pub content_blocks: Vec<ContentBlock>,
    pub tool_calls: Vec<ToolCall>,
    pub thinking: Vec<String>,
    pub assistant_text: Vec<String>,
    pub sub_agent_activity: Vec<SubAgentMessage>,
    /// Deduplicated per unique assistant-message id.
    pub token_usage: TokenTotals,
    /// From a trailing `system/turn_duration` record, when one was logged.
    pub duration_ms: Option<u64>,
    pub model: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Compaction digest generated by the summary record that immediately
    /// preceded this turn, if any.
    pub compaction_summary: Option<String>,
    /// Index into `ParsedSession::raw_messages` of this turn's first record.
    /// Anchors the rebuild point for incremental append parsing.
    pub raw_start: usize,
}

/// Aggregate statistics over a parsed session, including nested sub-agent
/// activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub turn_count: usize,
    pub token_usage: TokenTotals,
    pub tool_call_counts: BTreeMap<String, u32>,
    pub error_count: u32,
    pub total_duration_ms: u64,
    pub total_cost_usd: f64,
}

/// A fully reconstructed session.
///
/// Metadata fields take the first non-empty value seen across all raw
/// records. Instances are immutable once returned: append parsing produces
/// a new session, never in-place mutation of one already handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSession {
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub git_branch: Option<String>,
    pub cwd: Option<String>,
    pub slug: Option<String>,
    pub model: Option<String>,
    pub turns: Vec<Turn>,
    pub stats: SessionStats,
    pub raw_messages: Vec<RawMessage>,
    /// Set only when the first line carries branch-origin metadata.
    pub branched_from: Option<BranchOrigin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_totals_add() {
        let mut a = TokenTotals {
            input_tokens: 10,
            output_tokens: 5,
            cache_creation_tokens: 1,
            cache_read_tokens: 2,
            web_search_requests: 0,
        };
        let b = TokenTotals {
            input_tokens: 1,
            output_tokens: 1,
            cache_creation_tokens: 1,
            cache_read_tokens: 1,
            web_search_requests: 3,
        };
        a.add(&b);
        assert_eq!(a.input_tokens, 11);
        // 11 + 6 + 2 + 3; web search requests are not tokens.
        assert_eq!(a.total(), 22);
        assert_eq!(a.web_search_requests, 3);
    }

    #[test]
    fn test_tool_call_file_path_fallback() {
        let call = ToolCall {
            id: "t1".to_string(),
            name: "Edit".to_string(),
            input: serde_json::json!({"path": "/tmp/a.rs"}),
            result: None,
            is_error: false,
            timestamp: Utc::now(),
        };
        assert_eq!(call.file_path(), Some("/tmp/a.rs"));

        let call = ToolCall {
            input: serde_json::json!({"file_path": "/tmp/b.rs", "path": "/tmp/a.rs"}),
            ..call
        };
        assert_eq!(call.file_path(), Some("/tmp/b.rs"));
    }

    #[test]
    fn test_content_block_same_kind() {
        let a = ContentBlock::Text {
            chunks: vec!["a".to_string()],
        };
        let b = ContentBlock::Text { chunks: vec![] };
        let c = ContentBlock::Thinking { entries: vec![] };
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&c));
    }
}
