use crate::errors::{AppError, AppResult};
use crate::models::{Fact, GraphData, Priority, Project, Task, TaskStatus};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const ROOT_DIRS: &[&str] = &[
    "tasks",
    "memory/daily",
    "memory/facts",
    "life/areas/projects",
    "graph",
];

/// The full in-memory state of the workspace at one point in time. Rebuilt
/// from disk on every read request; never cached.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub facts: Vec<Fact>,
    pub graph: Option<GraphData>,
}

pub fn tasks_dir(root: &Path) -> PathBuf {
    root.join("tasks")
}

pub fn daily_dir(root: &Path) -> PathBuf {
    root.join("memory").join("daily")
}

pub fn facts_dir(root: &Path) -> PathBuf {
    root.join("memory").join("facts")
}

pub fn projects_dir(root: &Path) -> PathBuf {
    root.join("life").join("areas").join("projects")
}

pub fn graph_file(root: &Path) -> PathBuf {
    root.join("graph").join("graph.json")
}

pub fn task_path(root: &Path, task_id: &str) -> PathBuf {
    tasks_dir(root).join(format!("{}.json", sanitize_component(task_id)))
}

/// Idempotently creates the expected directory skeleton. Safe to call
/// repeatedly; create_dir_all is a no-op on existing directories.
pub fn ensure_topology(root: &Path) -> AppResult<()> {
    if !root.exists() {
        fs::create_dir_all(root).map_err(|error| AppError::Io(error.to_string()))?;
    }
    for rel in ROOT_DIRS {
        let dir = root.join(rel);
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|error| AppError::Io(error.to_string()))?;
        }
    }
    Ok(())
}

fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    let cleaned = out.trim_matches('_').to_string();
    if cleaned.is_empty() {
        "record".to_string()
    } else {
        cleaned
    }
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = fs::read(path).map_err(|error| AppError::Io(error.to_string()))?;
    serde_json::from_slice(&bytes).map_err(AppError::from)
}

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| AppError::Io(error.to_string()))?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes).map_err(|error| AppError::Io(error.to_string()))
}

/// Tolerant single-record read: a missing file is None, a malformed file is
/// logged and treated as None. Aggregation never fails on one bad record.
fn read_record<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(path = %path.to_string_lossy(), error = %error, "skipping unreadable record");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(path = %path.to_string_lossy(), error = %error, "skipping malformed record");
            None
        }
    }
}

/// Record files in a directory, sorted by filename. A missing directory is an
/// empty listing, not an error.
pub(crate) fn list_record_files(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|value| value.to_str()) == Some(ext))
        .collect();
    files.sort();
    files
}

fn list_project_dirs(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(|name| name.to_string()))
        .collect();
    names.sort();
    names
}

/// All task records, most recently updated first. The listing is
/// filename-sorted and the sort is stable, so equal timestamps keep filename
/// order.
pub fn load_all_tasks(root: &Path) -> Vec<Task> {
    let mut tasks: Vec<Task> = list_record_files(&tasks_dir(root), "json")
        .iter()
        .filter_map(|path| read_record::<Task>(path))
        .collect();

    for task in &tasks {
        if task.milestone_ref.is_some() && task.project_ref.is_none() {
            tracing::warn!(task = %task.id, "task has milestoneRef without projectRef");
        }
    }

    tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    tasks
}

pub fn load_project(root: &Path, project_id: &str) -> Option<Project> {
    let dir = projects_dir(root).join(project_id);
    let mut project: Project = read_record(&dir.join("meta.json"))?;

    project.path = dir.to_string_lossy().to_string();
    project.summary = fs::read_to_string(dir.join("summary.md")).ok();

    let mut seen = HashSet::new();
    for milestone in &project.milestones {
        if !seen.insert(milestone.id.as_str()) {
            tracing::warn!(project = %project.id, milestone = %milestone.id, "duplicate milestone id within project");
        }
    }

    Some(project)
}

/// All projects, ordered by priority (urgent/high first) then most recently
/// updated.
pub fn load_all_projects(root: &Path) -> Vec<Project> {
    let mut projects: Vec<Project> = list_project_dirs(&projects_dir(root))
        .iter()
        .filter_map(|name| load_project(root, name))
        .collect();

    projects.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
    projects
}

pub fn load_all_facts(root: &Path) -> Vec<Fact> {
    let mut facts: Vec<Fact> = list_record_files(&facts_dir(root), "json")
        .iter()
        .filter_map(|path| read_record::<Fact>(path))
        .collect();

    facts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    facts
}

/// The graph snapshot, if one has been generated. Never reconstructed here.
pub fn load_graph(root: &Path) -> Option<GraphData> {
    read_record(&graph_file(root))
}

pub fn load_snapshot(root: &Path) -> WorkspaceSnapshot {
    WorkspaceSnapshot {
        tasks: load_all_tasks(root),
        projects: load_all_projects(root),
        facts: load_all_facts(root),
        graph: load_graph(root),
    }
}

fn get_required_task(root: &Path, task_id: &str) -> AppResult<Task> {
    let path = task_path(root, task_id);
    if !path.exists() {
        return Err(AppError::NotFound(format!("Task '{}' not found", task_id)));
    }
    read_json_file(&path)
}

fn save_task(root: &Path, task: &Task) -> AppResult<()> {
    write_json_file(&task_path(root, &task.id), task)
}

pub fn set_task_status(root: &Path, task_id: &str, status: TaskStatus) -> AppResult<Task> {
    let mut task = get_required_task(root, task_id)?;
    task.status = status;
    task.updated_at = Utc::now();
    save_task(root, &task)?;
    Ok(task)
}

pub fn set_task_priority(root: &Path, task_id: &str, priority: Priority) -> AppResult<Task> {
    let mut task = get_required_task(root, task_id)?;
    task.priority = priority;
    task.updated_at = Utc::now();
    save_task(root, &task)?;
    Ok(task)
}

pub fn set_task_assignee(root: &Path, task_id: &str, assignee: Option<String>) -> AppResult<Task> {
    let mut task = get_required_task(root, task_id)?;
    task.assigned_to = assignee;
    task.updated_at = Utc::now();
    save_task(root, &task)?;
    Ok(task)
}
