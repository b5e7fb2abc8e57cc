use rewind_parser::{detect_pending_interaction, parse_session, PendingInteraction};
use serde_json::json;

fn user_line(text: &str) -> String {
    json!({
        "type": "user",
        "message": {"role": "user", "content": text},
        "timestamp": "2025-03-01T10:00:00Z",
    })
    .to_string()
}

fn tool_call_line(id: &str, name: &str, input: serde_json::Value) -> String {
    json!({
        "type": "assistant",
        "message": {
            "id": format!("msg_{id}"),
            "model": "claude-sonnet-4-5",
            "content": [{"type": "tool_use", "id": id, "name": name, "input": input}],
        },
        "timestamp": "2025-03-01T10:00:01Z",
    })
    .to_string()
}

fn tool_result_line(id: &str, text: &str) -> String {
    json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": [
                {"type": "tool_result", "tool_use_id": id, "content": text, "is_error": false}
            ],
        },
    })
    .to_string()
}

#[test]
fn unanswered_plan_detected() {
    let log = [
        user_line("make a plan"),
        tool_call_line(
            "t1",
            "ExitPlanMode",
            json!({"plan": "...", "allowedPrompts": ["do it", "change approach"]}),
        ),
    ]
    .join("\n");

    let session = parse_session(&log);
    match detect_pending_interaction(&session) {
        Some(PendingInteraction::Plan { allowed_prompts }) => {
            assert_eq!(allowed_prompts, vec!["do it", "change approach"]);
        }
        other => panic!("expected pending plan, got {other:?}"),
    }
}

#[test]
fn unanswered_question_detected() {
    let questions = json!([{"question": "Which database?", "options": ["postgres", "sqlite"]}]);
    let log = [
        user_line("set it up"),
        tool_call_line("t1", "AskUserQuestion", json!({"questions": questions})),
    ]
    .join("\n");

    let session = parse_session(&log);
    match detect_pending_interaction(&session) {
        Some(PendingInteraction::Question { questions: q }) => {
            assert_eq!(q.len(), 1);
            assert_eq!(q[0]["question"], "Which database?");
        }
        other => panic!("expected pending question, got {other:?}"),
    }
}

#[test]
fn answered_plan_is_not_pending() {
    let log = [
        user_line("make a plan"),
        tool_call_line("t1", "ExitPlanMode", json!({"allowedPrompts": ["go"]})),
        tool_result_line("t1", "approved"),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert!(detect_pending_interaction(&session).is_none());
}

#[test]
fn ordinary_unanswered_tool_call_is_not_pending() {
    let log = [
        user_line("read the file"),
        tool_call_line("t1", "Read", json!({"file_path": "a.rs"})),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert!(detect_pending_interaction(&session).is_none());
}

#[test]
fn repeated_identical_plan_suppressed() {
    // Same plan re-surfaced across consecutive turns reads as a loop,
    // not a fresh request.
    let input = json!({"plan": "same", "allowedPrompts": ["go"]});
    let log = [
        user_line("make a plan"),
        tool_call_line("t1", "ExitPlanMode", input.clone()),
        user_line("hmm"),
        tool_call_line("t2", "ExitPlanMode", input),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert!(detect_pending_interaction(&session).is_none());
}

#[test]
fn differing_plan_in_next_turn_still_pending() {
    let log = [
        user_line("make a plan"),
        tool_call_line("t1", "ExitPlanMode", json!({"plan": "v1", "allowedPrompts": ["go"]})),
        user_line("change it"),
        tool_call_line("t2", "ExitPlanMode", json!({"plan": "v2", "allowedPrompts": ["go"]})),
    ]
    .join("\n");

    let session = parse_session(&log);
    assert!(matches!(
        detect_pending_interaction(&session),
        Some(PendingInteraction::Plan { .. })
    ));
}
