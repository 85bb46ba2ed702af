//! Pure derivations over a workspace snapshot. No I/O; deterministic given
//! the snapshot and a date.

use crate::models::{
    DashboardStats, FactStats, Milestone, MilestoneProgress, Priority, ProjectProgress,
    ProjectStats, ProjectStatus, Task, TaskStats, TaskStatus,
};
use crate::workspace::WorkspaceSnapshot;
use chrono::NaiveDate;

pub fn project_ref_key(project_id: &str) -> String {
    format!("projects/{}", project_id)
}

fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.due_date
        .is_some_and(|due| due < today && task.status != TaskStatus::Done)
}

fn is_high_priority(task: &Task) -> bool {
    matches!(task.priority, Priority::High | Priority::Urgent) && task.status != TaskStatus::Done
}

/// Tasks due strictly before today (date-only comparison) and not done.
pub fn overdue_tasks(snapshot: &WorkspaceSnapshot, today: NaiveDate) -> Vec<Task> {
    snapshot
        .tasks
        .iter()
        .filter(|task| is_overdue(task, today))
        .cloned()
        .collect()
}

/// Tasks due exactly today, regardless of status.
pub fn tasks_due_today(snapshot: &WorkspaceSnapshot, today: NaiveDate) -> Vec<Task> {
    snapshot
        .tasks
        .iter()
        .filter(|task| task.due_date == Some(today))
        .cloned()
        .collect()
}

pub fn high_priority_tasks(snapshot: &WorkspaceSnapshot) -> Vec<Task> {
    snapshot
        .tasks
        .iter()
        .filter(|task| is_high_priority(task))
        .cloned()
        .collect()
}

/// Tasks whose project reference matches `projects/{project_id}` exactly.
pub fn tasks_for_project(snapshot: &WorkspaceSnapshot, project_id: &str) -> Vec<Task> {
    let key = project_ref_key(project_id);
    snapshot
        .tasks
        .iter()
        .filter(|task| task.project_ref.as_deref() == Some(key.as_str()))
        .cloned()
        .collect()
}

pub fn tasks_for_milestone(
    snapshot: &WorkspaceSnapshot,
    project_id: &str,
    milestone_id: &str,
) -> Vec<Task> {
    let key = project_ref_key(project_id);
    snapshot
        .tasks
        .iter()
        .filter(|task| {
            task.project_ref.as_deref() == Some(key.as_str())
                && task.milestone_ref.as_deref() == Some(milestone_id)
        })
        .cloned()
        .collect()
}

/// Integer percentage, round-half-up; 0 when the denominator is 0.
fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

pub fn project_progress(snapshot: &WorkspaceSnapshot, project_id: &str) -> ProjectProgress {
    let key = project_ref_key(project_id);
    let mut progress = ProjectProgress::default();
    for task in &snapshot.tasks {
        if task.project_ref.as_deref() != Some(key.as_str()) {
            continue;
        }
        progress.total += 1;
        match task.status {
            TaskStatus::Done => progress.completed += 1,
            TaskStatus::InProgress => progress.in_progress += 1,
            TaskStatus::Todo => progress.todo += 1,
            TaskStatus::Blocked => {}
        }
    }
    progress.percentage = percentage(progress.completed, progress.total);
    progress
}

/// Progress over the task ids listed on the milestone. Ids with no backing
/// task in the snapshot count toward neither numerator nor denominator.
pub fn milestone_progress(snapshot: &WorkspaceSnapshot, milestone: &Milestone) -> MilestoneProgress {
    let mut progress = MilestoneProgress::default();
    for task_id in &milestone.tasks {
        let Some(task) = snapshot.tasks.iter().find(|task| &task.id == task_id) else {
            continue;
        };
        progress.total += 1;
        if task.status == TaskStatus::Done {
            progress.completed += 1;
        }
    }
    progress.percentage = percentage(progress.completed, progress.total);
    progress
}

pub fn dashboard_stats(snapshot: &WorkspaceSnapshot, today: NaiveDate) -> DashboardStats {
    let mut tasks = TaskStats {
        total: snapshot.tasks.len(),
        ..TaskStats::default()
    };
    for task in &snapshot.tasks {
        match task.status {
            TaskStatus::Done => tasks.completed += 1,
            TaskStatus::InProgress => tasks.in_progress += 1,
            TaskStatus::Todo => tasks.todo += 1,
            TaskStatus::Blocked => tasks.blocked += 1,
        }
        if is_high_priority(task) {
            tasks.high_priority += 1;
        }
        if is_overdue(task, today) {
            tasks.overdue += 1;
        }
    }

    let mut projects = ProjectStats {
        total: snapshot.projects.len(),
        ..ProjectStats::default()
    };
    for project in &snapshot.projects {
        match project.status {
            ProjectStatus::Active => projects.active += 1,
            ProjectStatus::Archived => projects.archived += 1,
            ProjectStatus::Paused => projects.paused += 1,
        }
    }

    let facts = FactStats {
        total: snapshot.facts.len(),
        universal: snapshot.facts.iter().filter(|fact| fact.universal).count(),
    };

    DashboardStats {
        tasks,
        projects,
        facts,
    }
}
