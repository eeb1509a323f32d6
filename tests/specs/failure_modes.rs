//! A hard failure blocks its downstream forever; a soft failure does not.

use crate::prelude::Project;

#[test]
fn hard_failure_blocks_its_downstream() {
    let project = Project::new();
    let command = project.fake_agent_command();
    let runbook = format!(
        r#"{{
          "providers": {{ "coder": {{ "kind": "a", "command": "{command}" }} }},
          "tasks": {{
            "t1": {{ "role": "coder", "prompt": "fail=7", "failure_mode": "hard" }},
            "t2": {{ "role": "coder", "prompt": "noop", "depends_on": ["t1"] }}
          }}
        }}"#
    );
    let path = project.write_runbook("hard.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap()])
        .fails()
        .stdout_has("completed=0 failed=1 skipped=1 total=2");
}

#[test]
fn soft_failure_does_not_block_its_downstream() {
    let project = Project::new();
    let command = project.fake_agent_command();
    let runbook = format!(
        r#"{{
          "providers": {{ "coder": {{ "kind": "a", "command": "{command}" }} }},
          "tasks": {{
            "t1": {{ "role": "coder", "prompt": "fail=7", "failure_mode": "soft" }},
            "t2": {{ "role": "coder", "prompt": "noop", "depends_on": ["t1"] }}
          }}
        }}"#
    );
    let path = project.write_runbook("soft.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap()])
        .fails()
        .stdout_has("completed=1 failed=1 skipped=0 total=2");
}
