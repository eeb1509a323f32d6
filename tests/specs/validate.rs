//! `orc validate` parses and checks a runbook without running anything.

use crate::prelude::Project;

#[test]
fn validate_accepts_a_well_formed_runbook() {
    let project = Project::new();
    let runbook = r#"{
      "providers": { "coder": { "kind": "a", "command": "echo" } },
      "tasks": { "t1": { "role": "coder", "prompt": "noop" } }
    }"#;
    let path = project.write_runbook("good.json", runbook);

    project
        .orc()
        .args(&["validate", path.to_str().unwrap()])
        .passes()
        .stdout_has("1 provider(s), 0 workflow(s), 1 task(s)");
}

#[test]
fn validate_rejects_a_task_with_an_unknown_role() {
    let project = Project::new();
    let runbook = r#"{
      "providers": {},
      "tasks": { "t1": { "role": "ghost", "prompt": "noop" } }
    }"#;
    let path = project.write_runbook("bad.json", runbook);

    project.orc().args(&["validate", path.to_str().unwrap()]).fails();
}
