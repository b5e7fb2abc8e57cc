use rewind_types::{ReversibleCall, ToolCall, Turn};

/// Filter a turn's tool calls down to the reversible set: non-error
/// `Edit`/`Write` calls with a resolvable file path. Calls lacking a path
/// or marked error are excluded, not failed.
pub fn extract_reversible_calls(turn: &Turn) -> Vec<ReversibleCall> {
    turn.tool_calls.iter().filter_map(as_reversible).collect()
}

fn as_reversible(call: &ToolCall) -> Option<ReversibleCall> {
    if call.is_error {
        return None;
    }
    let file_path = call.file_path()?.to_string();

    match call.name.as_str() {
        "Edit" => Some(ReversibleCall::Edit {
            file_path,
            old_string: string_field(call, "old_string"),
            new_string: string_field(call, "new_string"),
            replace_all: call
                .input
                .get("replace_all")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }),
        "Write" => Some(ReversibleCall::Write {
            file_path,
            content: string_field(call, "content"),
        }),
        _ => None,
    }
}

fn string_field(call: &ToolCall, key: &str) -> String {
    call.input
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
