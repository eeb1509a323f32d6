//! A diamond-shaped DAG (t1 -> {t2, t3} -> t4) runs every task to
//! completion and the CLI reports a clean summary.

use crate::prelude::Project;

#[test]
fn diamond_dag_runs_every_task_to_completion() {
    let project = Project::new();
    let command = project.fake_agent_command();
    let runbook = format!(
        r#"{{
          "providers": {{ "coder": {{ "kind": "a", "command": "{command}" }} }},
          "tasks": {{
            "t1": {{ "role": "coder", "prompt": "noop" }},
            "t2": {{ "role": "coder", "prompt": "noop", "depends_on": ["t1"] }},
            "t3": {{ "role": "coder", "prompt": "noop", "depends_on": ["t1"] }},
            "t4": {{ "role": "coder", "prompt": "noop", "depends_on": ["t2", "t3"] }}
          }}
        }}"#
    );
    let path = project.write_runbook("diamond.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap(), "--repo", project.path().to_str().unwrap()])
        .passes()
        .stdout_has("completed=4 failed=0 skipped=0 total=4");

    assert!(project.worktree_dirs().is_empty(), "clean merges should leave no worktrees behind");
}
