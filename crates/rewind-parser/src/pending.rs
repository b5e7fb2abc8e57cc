use rewind_types::{ParsedSession, ToolCall, Turn};
use serde::Serialize;
use serde_json::Value;

const EXIT_PLAN_MODE: &str = "ExitPlanMode";
const ASK_USER_QUESTION: &str = "AskUserQuestion";

/// A tool call waiting on a human decision at the end of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PendingInteraction {
    Plan { allowed_prompts: Vec<String> },
    Question { questions: Vec<Value> },
}

/// Inspect the last turn's last tool call for an unanswered plan approval
/// or question prompt.
///
/// The previous turn acts as a loop guard: if it ended on an identical
/// pending call of the same tool, the prompt has already been surfaced
/// and is not raised again.
pub fn detect_pending_interaction(session: &ParsedSession) -> Option<PendingInteraction> {
    let last = session.turns.last()?;
    let call = pending_call(last)?;

    if session.turns.len() >= 2 {
        let previous = &session.turns[session.turns.len() - 2];
        if let Some(prev_call) = pending_call(previous)
            && prev_call.name == call.name
            && prev_call.input == call.input
        {
            return None;
        }
    }

    match call.name.as_str() {
        EXIT_PLAN_MODE => Some(PendingInteraction::Plan {
            allowed_prompts: call
                .input
                .get("allowedPrompts")
                .and_then(|v| v.as_array())
                .map(|prompts| {
                    prompts
                        .iter()
                        .filter_map(|p| p.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
        }),
        ASK_USER_QUESTION => Some(PendingInteraction::Question {
            questions: call
                .input
                .get("questions")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        }),
        _ => None,
    }
}

/// The turn's last tool call, when it is an interaction tool still
/// awaiting a decision (no result yet, or an error result signaling the
/// prompt was interrupted).
fn pending_call(turn: &Turn) -> Option<&ToolCall> {
    let call = turn.tool_calls.last()?;
    if call.name != EXIT_PLAN_MODE && call.name != ASK_USER_QUESTION {
        return None;
    }
    if call.result.is_none() || call.is_error {
        Some(call)
    } else {
        None
    }
}
