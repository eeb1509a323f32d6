//! Two independent tasks that declare an overlapping `write_files` entry
//! never run concurrently, even though nothing in the DAG orders them.

use crate::prelude::Project;
use std::fs;

#[test]
fn tasks_sharing_a_write_file_are_serialized() {
    let project = Project::new();
    let command = project.fake_agent_command();
    let log = project.scratch_path("race.log");
    let log_str = log.to_string_lossy().into_owned();

    let runbook = format!(
        r#"{{
          "providers": {{ "coder": {{ "kind": "a", "command": "{command}" }} }},
          "tasks": {{
            "slow": {{
              "role": "coder",
              "prompt": "extlog={log_str}:slow:150",
              "write_files": ["shared.txt"]
            }},
            "fast": {{
              "role": "coder",
              "prompt": "extlog={log_str}:fast:10",
              "write_files": ["shared.txt"]
            }}
          }}
        }}"#
    );
    let path = project.write_runbook("concurrent.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap(), "--concurrency", "2"])
        .passes()
        .stdout_has("completed=2 failed=0 skipped=0 total=2");

    let content = fs::read_to_string(&log).expect("race log should exist");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4, "each task logs a start and an end line: {lines:?}");

    // Whichever task ran first, its "end" line must precede the other
    // task's "start" line -- the two turns never overlapped in time.
    let first_label = lines[0].split_whitespace().next().unwrap();
    let first_end = lines.iter().position(|l| l.starts_with(&format!("{first_label} end"))).unwrap();
    let other_start = lines
        .iter()
        .position(|l| l.split_whitespace().next() != Some(first_label) && l.contains("start"))
        .unwrap();
    assert!(
        first_end < other_start,
        "tasks sharing a write_files entry overlapped: {lines:?}"
    );
}
