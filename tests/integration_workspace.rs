use std::fs;
use std::path::Path;

use workdeck::derive;
use workdeck::models::TaskStatus;
use workdeck::workspace;

fn temp_root() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp workspace root")
}

fn write_task_json(root: &Path, id: &str, body: &str) {
    let dir = root.join("tasks");
    fs::create_dir_all(&dir).expect("tasks dir");
    fs::write(dir.join(format!("{}.json", id)), body).expect("write task");
}

fn task_json(id: &str, status: &str, project_ref: Option<&str>, milestone_ref: Option<&str>) -> String {
    let project_ref = project_ref
        .map(|value| format!("\"{}\"", value))
        .unwrap_or_else(|| "null".to_string());
    let milestone_ref = milestone_ref
        .map(|value| format!("\"{}\"", value))
        .unwrap_or_else(|| "null".to_string());
    format!(
        r#"{{
            "id": "{id}",
            "title": "Task {id}",
            "status": "{status}",
            "priority": "medium",
            "dueDate": null,
            "projectRef": {project_ref},
            "milestoneRef": {milestone_ref},
            "assignedTo": null,
            "tags": ["inbox"],
            "createdAt": "2026-01-01T08:00:00Z",
            "updatedAt": "2026-01-01T09:00:00Z"
        }}"#
    )
}

fn write_project_json(root: &Path, id: &str, body: &str) {
    let dir = root.join("life/areas/projects").join(id);
    fs::create_dir_all(&dir).expect("project dir");
    fs::write(dir.join("meta.json"), body).expect("write meta");
}

#[test]
fn snapshot_assembles_all_record_kinds() {
    let root = temp_root();
    workspace::ensure_topology(root.path()).expect("topology");

    write_task_json(root.path(), "t1", &task_json("t1", "todo", Some("projects/alpha"), None));
    write_project_json(
        root.path(),
        "alpha",
        r#"{
            "id": "alpha",
            "name": "Alpha",
            "status": "active",
            "priority": "high",
            "tags": [],
            "milestones": [],
            "createdAt": "2026-01-01T08:00:00Z",
            "updatedAt": "2026-01-02T08:00:00Z"
        }"#,
    );
    fs::write(
        root.path().join("memory/facts/f1.json"),
        r#"{
            "id": "f1",
            "type": "preference",
            "content": "Prefers morning deep work",
            "tags": ["schedule"],
            "entityRef": null,
            "projectRef": null,
            "universal": true,
            "confidence": 0.9,
            "createdAt": "2026-01-03T08:00:00Z"
        }"#,
    )
    .expect("write fact");
    fs::write(
        root.path().join("graph/graph.json"),
        r#"{
            "version": 1,
            "generatedAt": "2026-01-04T08:00:00Z",
            "nodes": [{"id": "tasks/t1", "kind": "task", "label": "Task t1", "x": null, "y": null}],
            "edges": [{"source": "tasks/t1", "target": "projects/alpha", "relation": "part_of"}]
        }"#,
    )
    .expect("write graph");

    let snapshot = workspace::load_snapshot(root.path());
    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.tasks[0].project_ref.as_deref(), Some("projects/alpha"));
    assert_eq!(snapshot.projects.len(), 1);
    assert_eq!(snapshot.projects[0].id, "alpha");
    assert_eq!(snapshot.facts.len(), 1);
    assert!(snapshot.facts[0].universal);
    let graph = snapshot.graph.as_ref().expect("graph present");
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.edges.len(), 1);
}

#[test]
fn milestone_progress_counts_only_backed_tasks() {
    let root = temp_root();
    workspace::ensure_topology(root.path()).expect("topology");

    write_task_json(
        root.path(),
        "t1",
        &task_json("t1", "done", Some("projects/alpha"), Some("m1")),
    );
    write_task_json(
        root.path(),
        "t2",
        &task_json("t2", "todo", Some("projects/alpha"), Some("m2")),
    );
    write_project_json(
        root.path(),
        "alpha",
        r#"{
            "id": "alpha",
            "name": "Alpha",
            "status": "active",
            "priority": "high",
            "milestones": [
                {"id": "m1", "name": "First", "status": "in_progress", "priority": "high",
                 "dueDate": null, "tasks": ["t1", "missing-a"]},
                {"id": "m2", "name": "Second", "status": "todo", "priority": "medium",
                 "dueDate": null, "tasks": ["t2", "missing-b"]}
            ],
            "createdAt": "2026-01-01T08:00:00Z",
            "updatedAt": "2026-01-02T08:00:00Z"
        }"#,
    );

    let snapshot = workspace::load_snapshot(root.path());
    let project = &snapshot.projects[0];
    assert_eq!(project.milestones.len(), 2);

    let first = derive::milestone_progress(&snapshot, &project.milestones[0]);
    assert_eq!(first.total, 1);
    assert_eq!(first.completed, 1);
    assert_eq!(first.percentage, 100);

    let second = derive::milestone_progress(&snapshot, &project.milestones[1]);
    assert_eq!(second.total, 1);
    assert_eq!(second.completed, 0);
    assert_eq!(second.percentage, 0);

    let progress = derive::project_progress(&snapshot, "alpha");
    assert_eq!(progress.total, 2);
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.percentage, 50);
}

#[test]
fn status_write_back_survives_a_fresh_aggregation() {
    let root = temp_root();
    workspace::ensure_topology(root.path()).expect("topology");
    write_task_json(root.path(), "t1", &task_json("t1", "todo", None, None));

    let before = workspace::load_all_tasks(root.path());
    let updated =
        workspace::set_task_status(root.path(), "t1", TaskStatus::Done).expect("set status");
    assert!(updated.updated_at >= before[0].updated_at);

    let after = workspace::load_all_tasks(root.path());
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].status, TaskStatus::Done);
    assert!(after[0].updated_at >= before[0].updated_at);
    // untouched fields survive the overwrite
    assert_eq!(after[0].tags, vec!["inbox".to_string()]);
}

#[test]
fn unknown_fields_do_not_break_record_loads() {
    let root = temp_root();
    workspace::ensure_topology(root.path()).expect("topology");

    write_task_json(
        root.path(),
        "t1",
        r#"{
            "id": "t1",
            "title": "Task t1",
            "status": "todo",
            "priority": "low",
            "tags": [],
            "createdAt": "2026-01-01T08:00:00Z",
            "updatedAt": "2026-01-01T09:00:00Z",
            "someFutureField": {"nested": true}
        }"#,
    );

    let tasks = workspace::load_all_tasks(root.path());
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].due_date, None);
}
