use chrono::Utc;
use rewind_engine::{
    build_redo_from_archived, build_redo_operations, build_undo_operations, create_branch,
    summarize_operations,
};
use rewind_types::{FileOperation, ToolCall, Turn};
use serde_json::json;

fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        input,
        result: Some("ok".to_string()),
        is_error: false,
        timestamp: Utc::now(),
    }
}

fn turn(user_message: &str, calls: Vec<ToolCall>) -> Turn {
    Turn {
        user_message: Some(user_message.to_string()),
        content_blocks: Vec::new(),
        tool_calls: calls,
        thinking: Vec::new(),
        assistant_text: Vec::new(),
        sub_agent_activity: Vec::new(),
        token_usage: Default::default(),
        duration_ms: None,
        model: None,
        timestamp: Utc::now(),
        compaction_summary: None,
        raw_start: 0,
    }
}

fn edit(id: &str, path: &str, old: &str, new: &str) -> ToolCall {
    tool_call(
        id,
        "Edit",
        json!({"file_path": path, "old_string": old, "new_string": new}),
    )
}

fn write(id: &str, path: &str, content: &str) -> ToolCall {
    tool_call(id, "Write", json!({"file_path": path, "content": content}))
}

#[test]
fn undo_reverses_call_order_within_a_turn() {
    let turns = vec![turn(
        "change things",
        vec![edit("t1", "a.ts", "old", "new"), write("t2", "b.ts", "x")],
    )];

    let ops = build_undo_operations(&turns, 0, -1);
    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops[0],
        FileOperation::DeleteWrite {
            file_path: "b.ts".to_string(),
            content: "x".to_string(),
            turn_index: 0,
        }
    );
    assert_eq!(
        ops[1],
        FileOperation::ReverseEdit {
            file_path: "a.ts".to_string(),
            old_string: "new".to_string(),
            new_string: "old".to_string(),
            replace_all: false,
            turn_index: 0,
        }
    );
}

#[test]
fn undo_walks_turns_newest_first() {
    let turns = vec![
        turn("one", vec![edit("t1", "a.ts", "v0", "v1")]),
        turn("two", vec![edit("t2", "a.ts", "v1", "v2")]),
        turn("three", vec![edit("t3", "a.ts", "v2", "v3")]),
    ];

    let ops = build_undo_operations(&turns, 2, 0);
    let indices: Vec<usize> = ops.iter().map(|op| op.turn_index()).collect();
    assert_eq!(indices, vec![2, 1]);
    // No-op range.
    assert!(build_undo_operations(&turns, 1, 1).is_empty());
}

#[test]
fn redo_replays_oldest_first_in_original_order() {
    let turns = vec![
        turn("one", vec![edit("t1", "a.ts", "v0", "v1")]),
        turn(
            "two",
            vec![write("t2", "b.ts", "x"), edit("t3", "a.ts", "v1", "v2")],
        ),
    ];

    let ops = build_redo_operations(&turns, -1, 1);
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].turn_index(), 0);
    assert!(matches!(ops[0], FileOperation::ApplyEdit { .. }));
    assert!(matches!(
        &ops[1],
        FileOperation::CreateWrite { file_path, .. } if file_path == "b.ts"
    ));
    assert!(matches!(
        &ops[2],
        FileOperation::ApplyEdit { old_string, .. } if old_string == "v1"
    ));
}

#[test]
fn undo_then_redo_restores_edit_direction() {
    let turns = vec![
        turn("one", vec![edit("t1", "a.ts", "v0", "v1")]),
        turn("two", vec![edit("t2", "a.ts", "v1", "v2")]),
    ];

    let undo = build_undo_operations(&turns, 1, -1);
    let redo = build_redo_operations(&turns, -1, 1);

    // Each undo op has a mirror redo op with the strings swapped back.
    assert_eq!(undo.len(), redo.len());
    for (u, r) in undo.iter().rev().zip(redo.iter()) {
        match (u, r) {
            (
                FileOperation::ReverseEdit {
                    old_string: u_old,
                    new_string: u_new,
                    ..
                },
                FileOperation::ApplyEdit {
                    old_string: r_old,
                    new_string: r_new,
                    ..
                },
            ) => {
                assert_eq!(u_old, r_new);
                assert_eq!(u_new, r_old);
            }
            other => panic!("mismatched op pair: {other:?}"),
        }
    }
}

#[test]
fn ranges_out_of_bounds_are_ignored() {
    let turns = vec![turn("one", vec![edit("t1", "a.ts", "v0", "v1")])];
    // from beyond the turn list and to below -1 still terminate cleanly.
    let ops = build_undo_operations(&turns, 5, -3);
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].turn_index(), 0);
}

#[test]
fn archived_redo_respects_position_cap() {
    let turns = vec![
        turn("zero", vec![edit("t0", "base.ts", "a", "b")]),
        turn("one", vec![edit("t1", "a.ts", "v0", "v1")]),
        turn("two", vec![write("t2", "b.ts", "x")]),
        turn("three", vec![edit("t3", "a.ts", "v1", "v2")]),
    ];
    let branch = create_branch(&turns, 0, Vec::new(), Vec::new());
    assert_eq!(branch.turns.len(), 3);

    let all = build_redo_from_archived(&branch.turns, None);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].turn_index(), 1);
    assert_eq!(all[2].turn_index(), 3);

    let partial = build_redo_from_archived(&branch.turns, Some(1));
    assert_eq!(partial.len(), 2);
    assert_eq!(partial.last().unwrap().turn_index(), 2);

    // Cap past the end behaves like no cap.
    assert_eq!(build_redo_from_archived(&branch.turns, Some(99)).len(), 3);
}

#[test]
fn summary_counts_distinct_turns_and_files() {
    let turns = vec![
        turn(
            "one",
            vec![edit("t1", "a.ts", "v0", "v1"), write("t2", "b.ts", "x")],
        ),
        turn("two", vec![edit("t3", "a.ts", "v1", "v2")]),
    ];
    let ops = build_undo_operations(&turns, 1, -1);

    let summary = summarize_operations(&ops);
    assert_eq!(summary.operation_count, 3);
    assert_eq!(summary.turn_count, 2);
    assert_eq!(summary.file_count, 2);
    // First-seen order, deduplicated.
    assert_eq!(summary.file_paths, vec!["a.ts", "b.ts"]);

    let empty = summarize_operations(&[]);
    assert_eq!(empty.operation_count, 0);
    assert_eq!(empty.turn_count, 0);
    assert!(empty.file_paths.is_empty());
}
