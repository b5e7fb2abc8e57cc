//! Streaming session builder.
//!
//! One left-to-right scan over raw records, holding a single open turn
//! accumulator plus a map of in-flight sub-agent accumulators. The same
//! state machine drives both full parsing and the rewind-and-replay path
//! of incremental append parsing: `SessionBuilder::resume` seeds it with
//! already-built turns and replays a raw suffix.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rewind_types::{
    calculate_sub_agent_cost_estimated, calculate_turn_cost_estimated, truncate_chars,
    AssistantRecord, BranchOrigin, ContentBlock, ContentPart, ParsedSession, ProgressRecord,
    RawMessage, RawTokenUsage, SessionStats, SubAgentMessage, SystemRecord, TokenTotals, ToolCall,
    Turn, UserRecord,
};
use serde_json::Value;

use crate::thinking::{split_inline_thinking, TextSegment};

const TASK_TOOL: &str = "Task";
const PROMPT_PREVIEW_CHARS: usize = 120;
const MAX_SUMMARY_PROMPTS: usize = 6;
const DEFAULT_SUMMARY_TITLE: &str = "Conversation compacted";

pub(crate) fn parse_timestamp(ts: Option<&str>) -> DateTime<Utc> {
    ts.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn totals_from_raw(usage: &RawTokenUsage) -> TokenTotals {
    TokenTotals {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cache_creation_tokens: usage.cache_creation_input_tokens.unwrap_or(0),
        cache_read_tokens: usage.cache_read_input_tokens.unwrap_or(0),
        web_search_requests: usage
            .server_tool_use
            .as_ref()
            .map(|s| s.web_search_requests)
            .unwrap_or(0),
    }
}

/// Render a tool-result `content` value as the display string stored on
/// the call. Results arrive as a bare string or an array of text blocks.
fn result_text(content: Option<&Value>) -> String {
    match content {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

/// First-wins session metadata.
#[derive(Debug, Default, Clone)]
pub(crate) struct SessionMeta {
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub git_branch: Option<String>,
    pub cwd: Option<String>,
    pub slug: Option<String>,
    pub model: Option<String>,
    pub branched_from: Option<BranchOrigin>,
}

fn set_if_empty(slot: &mut Option<String>, value: Option<&String>) {
    if slot.is_none()
        && let Some(v) = value
        && !v.is_empty()
    {
        *slot = Some(v.clone());
    }
}

impl SessionMeta {
    fn absorb(&mut self, raw: &RawMessage, is_first_line: bool) {
        if let Some(fields) = raw.meta_fields() {
            set_if_empty(&mut self.session_id, fields.session_id.as_ref());
            set_if_empty(&mut self.version, fields.version.as_ref());
            set_if_empty(&mut self.git_branch, fields.git_branch.as_ref());
            set_if_empty(&mut self.cwd, fields.cwd.as_ref());
            set_if_empty(&mut self.slug, fields.slug.as_ref());
        }
        match raw {
            RawMessage::Assistant(asst) => {
                set_if_empty(&mut self.model, asst.message.model.as_ref());
            }
            RawMessage::User(user) => {
                if is_first_line && self.branched_from.is_none() {
                    self.branched_from = user.branched_from.clone();
                }
            }
            _ => {}
        }
    }

    pub(crate) fn from_session(session: &ParsedSession) -> Self {
        SessionMeta {
            session_id: session.session_id.clone(),
            version: session.version.clone(),
            git_branch: session.git_branch.clone(),
            cwd: session.cwd.clone(),
            slug: session.slug.clone(),
            model: session.model.clone(),
            branched_from: session.branched_from.clone(),
        }
    }
}

/// Turn/tool/prompt counters accumulated since the last compaction
/// boundary (or session start).
#[derive(Debug, Default, Clone)]
pub(crate) struct CompactionTracker {
    turn_count: usize,
    tool_counts: BTreeMap<String, u32>,
    prompts: Vec<String>,
}

impl CompactionTracker {
    pub(crate) fn record_turn(&mut self, turn: &Turn) {
        self.turn_count += 1;
        for call in &turn.tool_calls {
            *self.tool_counts.entry(call.name.clone()).or_insert(0) += 1;
        }
        if let Some(msg) = &turn.user_message {
            self.prompts.push(truncate_chars(msg, PROMPT_PREVIEW_CHARS));
        }
    }

    fn summary_string(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&format!("{} turns compacted", self.turn_count));

        if !self.tool_counts.is_empty() {
            let mut entries: Vec<(&String, &u32)> = self.tool_counts.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let histogram: Vec<String> = entries
                .iter()
                .map(|(name, count)| format!("{} x{}", name, count))
                .collect();
            out.push('\n');
            out.push_str(&histogram.join(", "));
        }

        if !self.prompts.is_empty() {
            out.push_str("\nPrompts:");
            for prompt in self.prompts.iter().take(MAX_SUMMARY_PROMPTS) {
                out.push('\n');
                out.push_str(prompt);
            }
            let overflow = self.prompts.len().saturating_sub(MAX_SUMMARY_PROMPTS);
            if overflow > 0 {
                out.push_str(&format!("\n...and {} more", overflow));
            }
        }

        out
    }

    fn reset(&mut self) {
        *self = CompactionTracker::default();
    }
}

/// Accumulator for the currently open turn.
#[derive(Debug)]
struct TurnBuilder {
    raw_start: usize,
    user_message: Option<String>,
    blocks: Vec<ContentBlock>,
    tool_calls: Vec<ToolCall>,
    thinking: Vec<String>,
    assistant_text: Vec<String>,
    sub_agent_activity: Vec<SubAgentMessage>,
    usage: TokenTotals,
    seen_usage_ids: HashSet<String>,
    duration_ms: Option<u64>,
    model: Option<String>,
    timestamp: DateTime<Utc>,
    compaction_summary: Option<String>,
}

impl TurnBuilder {
    fn new(
        raw_start: usize,
        timestamp: DateTime<Utc>,
        user_message: Option<String>,
        compaction_summary: Option<String>,
    ) -> Self {
        Self {
            raw_start,
            user_message,
            blocks: Vec::new(),
            tool_calls: Vec::new(),
            thinking: Vec::new(),
            assistant_text: Vec::new(),
            sub_agent_activity: Vec::new(),
            usage: TokenTotals::default(),
            seen_usage_ids: HashSet::new(),
            duration_ms: None,
            model: None,
            timestamp,
            compaction_summary,
        }
    }

    fn has_content(&self) -> bool {
        self.user_message.is_some()
            || !self.blocks.is_empty()
            || !self.tool_calls.is_empty()
            || !self.sub_agent_activity.is_empty()
    }

    fn push_thinking(&mut self, entry: String) {
        self.thinking.push(entry.clone());
        match self.blocks.last_mut() {
            Some(ContentBlock::Thinking { entries }) => entries.push(entry),
            _ => self.blocks.push(ContentBlock::Thinking {
                entries: vec![entry],
            }),
        }
    }

    fn push_text(&mut self, chunk: String) {
        self.assistant_text.push(chunk.clone());
        match self.blocks.last_mut() {
            Some(ContentBlock::Text { chunks }) => chunks.push(chunk),
            _ => self.blocks.push(ContentBlock::Text {
                chunks: vec![chunk],
            }),
        }
    }

    fn push_tool_call(&mut self, call: ToolCall) {
        let idx = self.tool_calls.len();
        self.tool_calls.push(call);
        match self.blocks.last_mut() {
            Some(ContentBlock::ToolCalls { calls }) => calls.push(idx),
            _ => self.blocks.push(ContentBlock::ToolCalls { calls: vec![idx] }),
        }
    }

    fn push_sub_agent(&mut self, message: SubAgentMessage) {
        let idx = self.sub_agent_activity.len();
        self.sub_agent_activity.push(message);
        match self.blocks.last_mut() {
            Some(ContentBlock::SubAgent { messages }) => messages.push(idx),
            _ => self.blocks.push(ContentBlock::SubAgent {
                messages: vec![idx],
            }),
        }
    }

    /// Resolve a pending tool result by id. Returns the resolved call's
    /// name so the caller can react to `Task` completions.
    fn resolve_tool_result(&mut self, id: &str, text: String, is_error: bool) -> Option<String> {
        let call = self.tool_calls.iter_mut().find(|c| c.id == id)?;
        call.result = Some(text);
        call.is_error = is_error;
        Some(call.name.clone())
    }

    fn add_usage(&mut self, message_id: &str, usage: &RawTokenUsage) {
        if self.seen_usage_ids.insert(message_id.to_string()) {
            self.usage.add(&totals_from_raw(usage));
        }
    }

    fn build(self) -> Turn {
        Turn {
            user_message: self.user_message,
            content_blocks: self.blocks,
            tool_calls: self.tool_calls,
            thinking: self.thinking,
            assistant_text: self.assistant_text,
            sub_agent_activity: self.sub_agent_activity,
            token_usage: self.usage,
            duration_ms: self.duration_ms,
            model: self.model,
            timestamp: self.timestamp,
            compaction_summary: self.compaction_summary,
            raw_start: self.raw_start,
        }
    }
}

/// Attach an already-built sub-agent message to a completed turn,
/// preserving the adjacent-block merge invariant. Used when activity
/// lands after its turn was flushed.
fn attach_sub_agent_to_turn(turn: &mut Turn, message: SubAgentMessage) {
    let idx = turn.sub_agent_activity.len();
    turn.sub_agent_activity.push(message);
    match turn.content_blocks.last_mut() {
        Some(ContentBlock::SubAgent { messages }) => messages.push(idx),
        _ => turn.content_blocks.push(ContentBlock::SubAgent {
            messages: vec![idx],
        }),
    }
}

/// Accumulator for one in-flight sub-agent batch.
#[derive(Debug)]
struct SubAgentBuilder {
    agent_id: String,
    parent_tool_use_id: Option<String>,
    thinking: Vec<String>,
    text: Vec<String>,
    tool_calls: Vec<ToolCall>,
    usage: TokenTotals,
    seen_usage_ids: HashSet<String>,
    model: Option<String>,
    timestamp: DateTime<Utc>,
    has_assistant_content: bool,
}

impl SubAgentBuilder {
    fn new(agent_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            parent_tool_use_id: None,
            thinking: Vec::new(),
            text: Vec::new(),
            tool_calls: Vec::new(),
            usage: TokenTotals::default(),
            seen_usage_ids: HashSet::new(),
            model: None,
            timestamp,
            has_assistant_content: false,
        }
    }

    fn build(self, agent_name: Option<String>, subagent_type: Option<String>) -> SubAgentMessage {
        SubAgentMessage {
            agent_id: self.agent_id,
            agent_name,
            subagent_type,
            thinking: self.thinking,
            text: self.text,
            tool_calls: self.tool_calls,
            token_usage: self.usage,
            model: self.model,
            timestamp: self.timestamp,
        }
    }
}

/// The scan state threaded over the raw record sequence.
pub(crate) struct SessionBuilder {
    meta: SessionMeta,
    turns: Vec<Turn>,
    current: Option<TurnBuilder>,
    subagents: HashMap<String, SubAgentBuilder>,
    /// Agent ids in first-seen order. Flushing several open agents at a
    /// turn boundary must not depend on map iteration order.
    subagent_order: Vec<String>,
    compaction: CompactionTracker,
    pending_summary: Option<String>,
    /// Agents whose first batch has already been flushed; later batches
    /// do not repeat the name metadata.
    named_agents: HashSet<String>,
    /// Index the next ingested record will occupy in `raw_messages`.
    raw_index: usize,
}

impl SessionBuilder {
    pub(crate) fn new() -> Self {
        Self {
            meta: SessionMeta::default(),
            turns: Vec::new(),
            current: None,
            subagents: HashMap::new(),
            subagent_order: Vec::new(),
            compaction: CompactionTracker::default(),
            pending_summary: None,
            named_agents: HashSet::new(),
            raw_index: 0,
        }
    }

    /// Resume the scan at a rebuild point: `kept` turns stay untouched and
    /// records from `raw_index` onward are replayed on top of them.
    pub(crate) fn resume(
        meta: SessionMeta,
        kept: Vec<Turn>,
        raw_index: usize,
        pending_summary: Option<String>,
    ) -> Self {
        let mut compaction = CompactionTracker::default();
        if pending_summary.is_none() {
            let start = kept
                .iter()
                .rposition(|t| t.compaction_summary.is_some())
                .unwrap_or(0);
            for turn in &kept[start..] {
                compaction.record_turn(turn);
            }
        }

        let named_agents = kept
            .iter()
            .flat_map(|t| t.sub_agent_activity.iter())
            .map(|m| m.agent_id.clone())
            .collect();

        Self {
            meta,
            turns: kept,
            current: None,
            subagents: HashMap::new(),
            subagent_order: Vec::new(),
            compaction,
            pending_summary,
            named_agents,
            raw_index,
        }
    }

    pub(crate) fn ingest(&mut self, raw: &RawMessage) {
        let idx = self.raw_index;
        self.raw_index += 1;
        self.meta.absorb(raw, idx == 0);

        match raw {
            RawMessage::User(user) => self.ingest_user(user, idx),
            RawMessage::Assistant(asst) => self.ingest_assistant(asst, idx),
            RawMessage::System(sys) => self.ingest_system(sys),
            RawMessage::Progress(prog) => self.ingest_progress(prog),
            RawMessage::Unknown => {}
        }
    }

    fn ingest_user(&mut self, user: &UserRecord, idx: usize) {
        let is_tool_result = user
            .message
            .content
            .iter()
            .any(|part| matches!(part, ContentPart::ToolResult { .. }));

        if is_tool_result {
            for part in &user.message.content {
                if let ContentPart::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } = part
                {
                    self.resolve_main_result(tool_use_id, result_text(content.as_ref()), *is_error);
                }
            }
            return;
        }

        self.flush_all_subagents();
        self.flush_current_turn();

        let text: Vec<&str> = user
            .message
            .content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        let joined = text.join("\n");
        let user_message = if joined.is_empty() { None } else { Some(joined) };

        self.current = Some(TurnBuilder::new(
            idx,
            parse_timestamp(user.timestamp.as_deref()),
            user_message,
            self.pending_summary.take(),
        ));
    }

    fn ingest_assistant(&mut self, asst: &AssistantRecord, idx: usize) {
        let timestamp = parse_timestamp(asst.timestamp.as_deref());

        // Without an open turn this opens a synthetic one: the log starts
        // mid-conversation.
        let pending_summary = &mut self.pending_summary;
        let turn = self
            .current
            .get_or_insert_with(|| TurnBuilder::new(idx, timestamp, None, pending_summary.take()));

        if turn.model.is_none() {
            turn.model = asst.message.model.clone();
        }

        for part in &asst.message.content {
            match part {
                ContentPart::Thinking { thinking } => turn.push_thinking(thinking.clone()),
                ContentPart::Text { text } => {
                    for segment in split_inline_thinking(text) {
                        match segment {
                            TextSegment::Thinking(entry) => turn.push_thinking(entry),
                            TextSegment::Text(chunk) => turn.push_text(chunk),
                        }
                    }
                }
                ContentPart::ToolUse { id, name, input } => {
                    turn.push_tool_call(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                        result: None,
                        is_error: false,
                        timestamp,
                    });
                }
                ContentPart::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    turn.resolve_tool_result(tool_use_id, result_text(content.as_ref()), *is_error);
                }
                ContentPart::Unknown => {}
            }
        }

        if let Some(usage) = &asst.message.usage {
            turn.add_usage(&asst.message.id, usage);
        }
    }

    fn ingest_system(&mut self, sys: &SystemRecord) {
        match sys.subtype.as_str() {
            SystemRecord::SUBTYPE_TURN_DURATION => {
                if let Some(duration) = sys.duration_ms {
                    if let Some(turn) = self.current.as_mut() {
                        turn.duration_ms = Some(duration);
                    } else if let Some(turn) = self.turns.last_mut() {
                        turn.duration_ms = Some(duration);
                    }
                }
            }
            SystemRecord::SUBTYPE_SUMMARY => {
                self.flush_all_subagents();
                self.flush_current_turn();
                let title = sys.summary.as_deref().unwrap_or(DEFAULT_SUMMARY_TITLE);
                self.pending_summary = Some(self.compaction.summary_string(title));
                self.compaction.reset();
            }
            _ => {}
        }
    }

    fn ingest_progress(&mut self, prog: &ProgressRecord) {
        let timestamp = parse_timestamp(prog.timestamp.as_deref());

        let builder = match self.subagents.entry(prog.agent_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.subagent_order.push(prog.agent_id.clone());
                entry.insert(SubAgentBuilder::new(prog.agent_id.clone(), timestamp))
            }
        };
        if builder.parent_tool_use_id.is_none() {
            builder.parent_tool_use_id = prog.parent_tool_use_id.clone();
        }

        if prog.message.role == "assistant" {
            builder.has_assistant_content = true;
            if builder.model.is_none() {
                builder.model = prog.message.model.clone();
            }
            for part in &prog.message.content {
                match part {
                    ContentPart::Thinking { thinking } => builder.thinking.push(thinking.clone()),
                    ContentPart::Text { text } => builder.text.push(text.clone()),
                    ContentPart::ToolUse { id, name, input } => builder.tool_calls.push(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                        result: None,
                        is_error: false,
                        timestamp,
                    }),
                    ContentPart::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => {
                        if let Some(call) =
                            builder.tool_calls.iter_mut().find(|c| c.id == *tool_use_id)
                        {
                            call.result = Some(result_text(content.as_ref()));
                            call.is_error = *is_error;
                        }
                    }
                    ContentPart::Unknown => {}
                }
            }
            if let Some(usage) = &prog.message.usage {
                let dedup_key = prog.message.id.clone();
                match dedup_key {
                    Some(id) => {
                        if builder.seen_usage_ids.insert(id) {
                            builder.usage.add(&totals_from_raw(usage));
                        }
                    }
                    None => builder.usage.add(&totals_from_raw(usage)),
                }
            }
            return;
        }

        // Role switched back to user: a natural break in the agent's
        // stream. Flush the accumulated batch, then let the user-role
        // content resolve the batch's pending tool results.
        if builder.has_assistant_content {
            self.flush_subagent(&prog.agent_id);
        }
        for part in &prog.message.content {
            if let ContentPart::ToolResult {
                tool_use_id,
                content,
                is_error,
            } = part
            {
                self.resolve_sub_agent_result(tool_use_id, result_text(content.as_ref()), *is_error);
            }
        }
    }

    /// Resolve a main-stream tool result: the open turn first, then the
    /// immediately preceding turn (results can be logged slightly out of
    /// order). A resolved `Task` call ends its sub-agent's contribution.
    fn resolve_main_result(&mut self, tool_use_id: &str, text: String, is_error: bool) {
        let resolved_name = self
            .current
            .as_mut()
            .and_then(|turn| turn.resolve_tool_result(tool_use_id, text.clone(), is_error))
            .or_else(|| {
                self.turns.last_mut().and_then(|turn| {
                    let call = turn.tool_calls.iter_mut().find(|c| c.id == tool_use_id)?;
                    call.result = Some(text);
                    call.is_error = is_error;
                    Some(call.name.clone())
                })
            });

        if resolved_name.as_deref() == Some(TASK_TOOL) {
            let finished: Vec<String> = self
                .subagents
                .values()
                .filter(|b| b.parent_tool_use_id.as_deref() == Some(tool_use_id))
                .map(|b| b.agent_id.clone())
                .collect();
            for agent_id in finished {
                self.flush_subagent(&agent_id);
            }
        }
    }

    /// Resolve a tool result inside a sub-agent stream: the open builder
    /// first, then batches already flushed into the current turn.
    fn resolve_sub_agent_result(&mut self, tool_use_id: &str, text: String, is_error: bool) {
        for builder in self.subagents.values_mut() {
            if let Some(call) = builder.tool_calls.iter_mut().find(|c| c.id == tool_use_id) {
                call.result = Some(text);
                call.is_error = is_error;
                return;
            }
        }
        if let Some(turn) = self.current.as_mut() {
            for message in turn.sub_agent_activity.iter_mut().rev() {
                if let Some(call) = message.tool_calls.iter_mut().find(|c| c.id == tool_use_id) {
                    call.result = Some(text);
                    call.is_error = is_error;
                    return;
                }
            }
        }
    }

    /// Find the `Task` tool call that spawned an agent, to read its name
    /// metadata from the call input.
    fn find_task_input(&self, tool_use_id: &str) -> Option<Value> {
        let matching = |call: &&ToolCall| call.id == tool_use_id && call.name == TASK_TOOL;
        if let Some(turn) = self.current.as_ref()
            && let Some(call) = turn.tool_calls.iter().find(&matching)
        {
            return Some(call.input.clone());
        }
        self.turns
            .iter()
            .rev()
            .find_map(|turn| turn.tool_calls.iter().find(&matching))
            .map(|call| call.input.clone())
    }

    fn flush_subagent(&mut self, agent_id: &str) {
        let Some(builder) = self.subagents.remove(agent_id) else {
            return;
        };
        self.subagent_order.retain(|id| id != agent_id);

        let (agent_name, subagent_type) = if self.named_agents.insert(agent_id.to_string()) {
            let input = builder
                .parent_tool_use_id
                .as_deref()
                .and_then(|id| self.find_task_input(id));
            let name = input.as_ref().and_then(|v| {
                v.get("name")
                    .or_else(|| v.get("description"))
                    .and_then(|n| n.as_str())
                    .map(String::from)
            });
            let kind = input.as_ref().and_then(|v| {
                v.get("subagent_type")
                    .and_then(|n| n.as_str())
                    .map(String::from)
            });
            (name, kind)
        } else {
            (None, None)
        };

        let message = builder.build(agent_name, subagent_type);
        if let Some(turn) = self.current.as_mut() {
            turn.push_sub_agent(message);
        } else if let Some(turn) = self.turns.last_mut() {
            attach_sub_agent_to_turn(turn, message);
        }
        // No turn at all: progress with no conversation context is dropped.
    }

    fn flush_all_subagents(&mut self) {
        let ids = std::mem::take(&mut self.subagent_order);
        for agent_id in ids {
            self.flush_subagent(&agent_id);
        }
    }

    fn flush_current_turn(&mut self) {
        if let Some(builder) = self.current.take() {
            if builder.has_content() {
                let turn = builder.build();
                self.compaction.record_turn(&turn);
                self.turns.push(turn);
            } else if builder.compaction_summary.is_some() {
                // An empty accumulator still carries its summary forward.
                self.pending_summary = builder.compaction_summary;
            }
        }
    }

    /// Close out the scan and assemble the session.
    pub(crate) fn into_session(mut self, raw_messages: Vec<RawMessage>) -> ParsedSession {
        self.flush_all_subagents();
        self.flush_current_turn();

        let stats = compute_stats(&self.turns);
        ParsedSession {
            session_id: self.meta.session_id,
            version: self.meta.version,
            git_branch: self.meta.git_branch,
            cwd: self.meta.cwd,
            slug: self.meta.slug,
            model: self.meta.model,
            turns: self.turns,
            stats,
            raw_messages,
            branched_from: self.meta.branched_from,
        }
    }
}

/// Aggregate stats over all turns and their nested sub-agent activity.
pub(crate) fn compute_stats(turns: &[Turn]) -> SessionStats {
    let mut stats = SessionStats {
        turn_count: turns.len(),
        ..SessionStats::default()
    };

    for turn in turns {
        stats.token_usage.add(&turn.token_usage);
        for call in &turn.tool_calls {
            *stats.tool_call_counts.entry(call.name.clone()).or_insert(0) += 1;
            if call.is_error {
                stats.error_count += 1;
            }
        }
        if let Some(duration) = turn.duration_ms {
            stats.total_duration_ms += duration;
        }
        stats.total_cost_usd += calculate_turn_cost_estimated(turn);

        for message in &turn.sub_agent_activity {
            stats.token_usage.add(&message.token_usage);
            for call in &message.tool_calls {
                *stats.tool_call_counts.entry(call.name.clone()).or_insert(0) += 1;
                if call.is_error {
                    stats.error_count += 1;
                }
            }
            stats.total_cost_usd += calculate_sub_agent_cost_estimated(message);
        }
    }

    stats
}
