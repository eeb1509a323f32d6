//! A merge conflict between two task branches is reported, not treated
//! as a task failure -- the conflicting worktree is left for inspection.

use crate::prelude::Project;

#[test]
fn merge_conflict_is_preserved_and_is_not_a_task_failure() {
    let project = Project::new();
    let command = project.fake_agent_command();
    project.file("conflict.txt", "base\n");
    project.orc_git_commit_all("seed conflict file");

    let runbook = format!(
        r#"{{
          "providers": {{ "coder": {{ "kind": "a", "command": "{command}" }} }},
          "tasks": {{
            "t1": {{ "role": "coder", "prompt": "write=conflict.txt:from-t1" }},
            "t2": {{ "role": "coder", "prompt": "write=conflict.txt:from-t2" }}
          }}
        }}"#
    );
    let path = project.write_runbook("conflict.json", &runbook);

    project
        .orc()
        .args(&["run", path.to_str().unwrap()])
        .passes()
        .stdout_has("completed=2 failed=0 skipped=0 total=2");

    let leftover = project.worktree_dirs();
    assert_eq!(
        leftover.len(),
        1,
        "exactly one task's worktree should survive for the conflicting merge: {leftover:?}"
    );
}
