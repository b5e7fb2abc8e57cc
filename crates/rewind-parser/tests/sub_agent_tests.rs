use rewind_parser::parse_session;
use serde_json::json;

fn user_line(text: &str) -> String {
    json!({
        "type": "user",
        "message": {"role": "user", "content": text},
        "timestamp": "2025-03-01T10:00:00Z",
        "sessionId": "sess-1",
    })
    .to_string()
}

fn task_call_line() -> String {
    json!({
        "type": "assistant",
        "message": {
            "id": "msg_1",
            "model": "claude-opus-4-6",
            "content": [{
                "type": "tool_use",
                "id": "task_1",
                "name": "Task",
                "input": {
                    "description": "Explore the codebase",
                    "subagent_type": "general-purpose",
                    "prompt": "look around"
                }
            }],
            "usage": {"input_tokens": 10, "output_tokens": 5},
        },
        "timestamp": "2025-03-01T10:00:01Z",
    })
    .to_string()
}

fn progress_assistant(agent_id: &str, content: serde_json::Value, msg_id: &str) -> String {
    json!({
        "type": "progress",
        "agentId": agent_id,
        "parentToolUseId": "task_1",
        "message": {
            "role": "assistant",
            "id": msg_id,
            "model": "claude-haiku-4-5",
            "content": content,
            "usage": {"input_tokens": 40, "output_tokens": 8},
        },
        "timestamp": "2025-03-01T10:00:02Z",
    })
    .to_string()
}

fn progress_user_result(agent_id: &str, tool_use_id: &str, text: &str) -> String {
    json!({
        "type": "progress",
        "agentId": agent_id,
        "parentToolUseId": "task_1",
        "message": {
            "role": "user",
            "content": [
                {"type": "tool_result", "tool_use_id": tool_use_id, "content": text, "is_error": false}
            ],
        },
        "timestamp": "2025-03-01T10:00:03Z",
    })
    .to_string()
}

#[test]
fn sub_agent_batch_flushed_on_role_switch() {
    let log = [
        user_line("do the task"),
        task_call_line(),
        progress_assistant(
            "ag1",
            json!([
                {"type": "thinking", "thinking": "scanning"},
                {"type": "text", "text": "I'll look"},
                {"type": "tool_use", "id": "sub_t1", "name": "Read", "input": {"file_path": "x.rs"}}
            ]),
            "sub_msg_1",
        ),
        progress_user_result("ag1", "sub_t1", "file contents"),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert_eq!(session.turns.len(), 1);

    let activity = &session.turns[0].sub_agent_activity;
    assert_eq!(activity.len(), 1);
    let message = &activity[0];
    assert_eq!(message.agent_id, "ag1");
    assert_eq!(message.agent_name.as_deref(), Some("Explore the codebase"));
    assert_eq!(message.subagent_type.as_deref(), Some("general-purpose"));
    assert_eq!(message.thinking, vec!["scanning".to_string()]);
    assert_eq!(message.text, vec!["I'll look".to_string()]);
    assert_eq!(message.model.as_deref(), Some("claude-haiku-4-5"));

    // The user-role batch resolved the sub-agent's own tool call after
    // the flush.
    assert_eq!(
        message.tool_calls[0].result.as_deref(),
        Some("file contents")
    );
}

#[test]
fn sub_agent_flushed_when_task_result_arrives() {
    let log = [
        user_line("do the task"),
        task_call_line(),
        progress_assistant(
            "ag1",
            json!([{"type": "text", "text": "working"}]),
            "sub_msg_1",
        ),
        // Task completes without an intervening role switch.
        json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [
                    {"type": "tool_result", "tool_use_id": "task_1", "content": "task done", "is_error": false}
                ],
            },
        })
        .to_string(),
    ]
    .join("\n");

    let session = parse_session(&log);
    let turn = &session.turns[0];
    assert_eq!(turn.tool_calls[0].result.as_deref(), Some("task done"));
    assert_eq!(turn.sub_agent_activity.len(), 1);
    assert_eq!(turn.sub_agent_activity[0].text, vec!["working".to_string()]);
}

#[test]
fn sub_agent_name_attached_to_first_batch_only() {
    let log = [
        user_line("do the task"),
        task_call_line(),
        progress_assistant("ag1", json!([{"type": "text", "text": "one"}]), "sub_msg_1"),
        progress_user_result("ag1", "none", ""),
        progress_assistant("ag1", json!([{"type": "text", "text": "two"}]), "sub_msg_2"),
        progress_user_result("ag1", "none", ""),
    ]
    .join("\n");

    let session = parse_session(&log);
    let activity = &session.turns[0].sub_agent_activity;
    assert_eq!(activity.len(), 2);
    assert!(activity[0].agent_name.is_some());
    assert!(activity[1].agent_name.is_none());
}

#[test]
fn sub_agent_usage_deduplicated_and_counted_in_stats() {
    let log = [
        user_line("do the task"),
        task_call_line(),
        progress_assistant("ag1", json!([{"type": "text", "text": "a"}]), "sub_msg_1"),
        progress_assistant("ag1", json!([{"type": "text", "text": "b"}]), "sub_msg_1"),
        progress_assistant("ag1", json!([{"type": "text", "text": "c"}]), "sub_msg_2"),
        progress_user_result("ag1", "none", ""),
    ]
    .join("\n");

    let session = parse_session(&log);
    let message = &session.turns[0].sub_agent_activity[0];
    // sub_msg_1 counted once, sub_msg_2 once.
    assert_eq!(message.token_usage.input_tokens, 80);
    assert_eq!(message.token_usage.output_tokens, 16);

    // Session stats fold in both the parent turn and the sub-agent.
    assert_eq!(session.stats.token_usage.input_tokens, 10 + 80);
}

#[test]
fn simultaneous_agents_flush_in_arrival_order() {
    let mut lines = vec![user_line("fan out"), task_call_line()];
    for agent in ["ag-c", "ag-a", "ag-b"] {
        lines.push(
            json!({
                "type": "progress",
                "agentId": agent,
                "parentToolUseId": "task_1",
                "message": {
                    "role": "assistant",
                    "id": format!("sub_{agent}"),
                    "content": [{"type": "text", "text": "working"}],
                },
                "timestamp": "2025-03-01T10:00:02Z",
            })
            .to_string(),
        );
    }
    lines.push(user_line("next"));
    let log = lines.join("\n");

    // All three are still open at the turn boundary; they must flush in
    // the order their first progress record arrived, every run.
    let session = parse_session(&log);
    let order: Vec<&str> = session.turns[0]
        .sub_agent_activity
        .iter()
        .map(|m| m.agent_id.as_str())
        .collect();
    assert_eq!(order, vec!["ag-c", "ag-a", "ag-b"]);
}

#[test]
fn open_sub_agent_flushed_when_next_turn_starts() {
    let log = [
        user_line("do the task"),
        task_call_line(),
        progress_assistant(
            "ag1",
            json!([{"type": "text", "text": "still going"}]),
            "sub_msg_1",
        ),
        user_line("never mind, new question"),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert_eq!(session.turns.len(), 2);
    // The in-flight batch belongs to the turn that was open when the
    // boundary hit.
    assert_eq!(session.turns[0].sub_agent_activity.len(), 1);
    assert!(session.turns[1].sub_agent_activity.is_empty());
}
