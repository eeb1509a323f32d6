// SPDX-License-Identifier: MIT

use super::*;

fn standard() -> Workflow {
    Workflow::new(
        "standard",
        vec![
            WorkflowStep::new("coder"),
            WorkflowStep::new("reviewer"),
            WorkflowStep::new("tester"),
        ],
    )
}

#[test]
fn next_after_middle_step() {
    let w = standard();
    assert_eq!(w.next_after("coder").unwrap().agent_role, "reviewer");
    assert_eq!(w.next_after("reviewer").unwrap().agent_role, "tester");
}

#[test]
fn next_after_last_step_is_none() {
    let w = standard();
    assert!(w.next_after("tester").is_none());
}

#[test]
fn next_after_unknown_role_is_none() {
    let w = standard();
    assert!(w.next_after("designer").is_none());
}

#[test]
fn position_of_finds_index() {
    let w = standard();
    assert_eq!(w.position_of("reviewer"), Some(1));
    assert_eq!(w.position_of("nope"), None);
}
