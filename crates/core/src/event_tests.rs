// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn task_started_serializes_with_type_tag() {
    let e = Event::TaskStarted {
        task_id: TaskId::new("a"),
        ts_ms: 42,
    };
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["type"], "task-started");
    assert_eq!(json["task_id"], "a");
    assert_eq!(json["ts_ms"], 42);
}

#[test]
fn task_merged_round_trips() {
    let e = Event::TaskMerged {
        task_id: TaskId::new("b"),
        conflict: true,
        ts_ms: 7,
    };
    let json = serde_json::to_string(&e).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(e, back);
}

#[test]
fn dag_progress_has_no_task_id() {
    let e = Event::DagProgress {
        completed: 2,
        failed: 1,
        total: 4,
        ts_ms: 0,
    };
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["type"], "dag-progress");
    assert_eq!(json["total"], 4);
}
