//! Completing a task whose role is a workflow's first step spawns the
//! next step as a new, dependent task.

use crate::prelude::Project;

#[test]
fn completing_a_step_spawns_the_next_workflow_step() {
    let project = Project::new();
    let command = project.fake_agent_command();
    let runbook = format!(
        r#"{{
          "providers": {{
            "coder": {{ "kind": "a", "command": "{command}" }},
            "reviewer": {{ "kind": "a", "command": "{command}" }}
          }},
          "workflows": {{
            "pipeline": {{ "steps": ["coder", "reviewer"] }}
          }},
          "tasks": {{
            "t1": {{ "role": "coder", "prompt": "noop" }}
          }}
        }}"#
    );
    let path = project.write_runbook("pipeline.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap()])
        .passes()
        .stdout_has("completed=2 failed=0 skipped=0 total=2");
}
