use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded line of the append-only session log.
///
/// The log is newline-delimited JSON; each line is one of these records.
/// Records are retained verbatim in `ParsedSession::raw_messages` so that
/// incremental append parsing can replay a suffix without re-reading the
/// original file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum RawMessage {
    User(UserRecord),
    Assistant(AssistantRecord),
    System(SystemRecord),
    Progress(ProgressRecord),
    #[serde(other)]
    Unknown,
}

impl RawMessage {
    /// Session metadata carried on this record, if any.
    pub fn meta_fields(&self) -> Option<&RecordMeta> {
        match self {
            RawMessage::User(r) => Some(&r.meta),
            RawMessage::Assistant(r) => Some(&r.meta),
            _ => None,
        }
    }
}

/// Session-level metadata fields shared by user and assistant records.
///
/// Every field is optional on the wire; the parser takes the first
/// non-empty value seen across the whole log (first-wins).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub message: UserMessage,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Present only when this session was restored from an archived branch.
    #[serde(default)]
    pub branched_from: Option<BranchOrigin>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserMessage {
    pub role: String,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRecord {
    pub message: AssistantMessage,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssistantMessage {
    /// API message id. One API call may be logged as several lines while
    /// content streams in; they all share this id.
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<ContentPart>,
    #[serde(default)]
    pub usage: Option<RawTokenUsage>,
}

/// One content block inside a user, assistant, or progress message.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

/// A bare string in a `content` field is shorthand for a single text block.
fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<ContentPart>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrArray {
        String(String),
        Array(Vec<ContentPart>),
    }

    match StringOrArray::deserialize(deserializer)? {
        StringOrArray::String(s) => Ok(vec![ContentPart::Text { text: s }]),
        StringOrArray::Array(arr) => Ok(arr),
    }
}

/// System record, discriminated by `subtype`.
///
/// `summary` records mark a compaction boundary; `turn_duration` records
/// report wall-clock duration for the turn they trail.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemRecord {
    pub subtype: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl SystemRecord {
    pub const SUBTYPE_SUMMARY: &'static str = "summary";
    pub const SUBTYPE_TURN_DURATION: &'static str = "turn_duration";
}

/// Progress from a nested agent invocation (a `Task` tool call).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub agent_id: String,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    pub message: ProgressMessage,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProgressMessage {
    pub role: String,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<ContentPart>,
    /// API message id of the sub-agent's own assistant message, when the
    /// progress batch mirrors one. Used for usage deduplication.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<RawTokenUsage>,
}

/// Token usage as reported on the wire for one API message.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct RawTokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
    #[serde(default)]
    pub server_tool_use: Option<ServerToolUse>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ServerToolUse {
    #[serde(default)]
    pub web_search_requests: u32,
}

/// Branch-origin metadata on the first line of a restored session.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BranchOrigin {
    pub branch_id: String,
    #[serde(default)]
    pub branch_point_turn_index: Option<i64>,
}
