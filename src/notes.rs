//! Daily-note markdown parsing: frontmatter, checklist items, time blocks,
//! and inline tags. Read-only; checklist items stay note-local and are never
//! promoted to task records.

use crate::errors::{AppError, AppResult};
use crate::models::{BlockKind, ChecklistItem, NoteDocument, Priority, TimeBlock};
use crate::workspace::{daily_dir, list_record_files};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

static CHECKLIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- \[([ xX])\] (.+)$").expect("checklist regex"));
static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(urgent|high|medium|low)\b").expect("priority regex"));
static PROJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#project/([\w-]+)").expect("project tag regex"));
static DUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#due/(\d{4}-\d{2}-\d{2})").expect("due tag regex"));
static TIME_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})\s+(.+)").expect("time block regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([\w/-]+)").expect("tag regex"));

pub fn parse_note(path: &Path) -> AppResult<NoteDocument> {
    let raw = fs::read_to_string(path).map_err(|error| AppError::Io(error.to_string()))?;
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let (frontmatter, content) = split_frontmatter(path, &raw);
    let items = extract_items(&content);
    let blocks = extract_blocks(&content);
    let tags = extract_tags(&content);

    Ok(NoteDocument {
        path: path.to_string_lossy().to_string(),
        frontmatter,
        content,
        items,
        blocks,
        tags,
        modified,
    })
}

/// Splits `---` frontmatter from the body. Malformed frontmatter degrades to
/// an empty map with a diagnostic; the body is always preserved.
fn split_frontmatter(path: &Path, raw: &str) -> (Map<String, Value>, String) {
    let Some(rest) = raw.strip_prefix("---\n") else {
        return (Map::new(), raw.to_string());
    };
    let Some(split_at) = rest.find("\n---\n") else {
        tracing::warn!(path = %path.to_string_lossy(), "frontmatter missing closing delimiter");
        return (Map::new(), raw.to_string());
    };
    let frontmatter = &rest[..split_at];
    let body = rest[(split_at + 5)..].to_string();

    let metadata: Option<Value> = match serde_json::from_str(frontmatter) {
        Ok(value) => Some(value),
        Err(_) => match serde_yaml::from_str::<serde_yaml::Value>(frontmatter) {
            Ok(yaml_value) => serde_json::to_value(yaml_value).ok(),
            Err(error) => {
                tracing::warn!(path = %path.to_string_lossy(), error = %error, "invalid frontmatter");
                None
            }
        },
    };

    match metadata {
        Some(Value::Object(map)) => (map, body),
        Some(_) | None => (Map::new(), body),
    }
}

fn extract_items(content: &str) -> Vec<ChecklistItem> {
    let mut items = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let Some(captures) = CHECKLIST_RE.captures(line) else {
            continue;
        };
        let done = !captures[1].trim().is_empty();
        let raw_title = captures[2].trim();

        let priority = PRIORITY_RE
            .captures(raw_title)
            .map(|c| match &c[1] {
                "urgent" => Priority::Urgent,
                "high" => Priority::High,
                "low" => Priority::Low,
                _ => Priority::Medium,
            })
            .unwrap_or(Priority::Medium);
        let project_id = PROJECT_RE
            .captures(raw_title)
            .map(|c| c[1].to_string());
        let due_date: Option<NaiveDate> = DUE_RE
            .captures(raw_title)
            .and_then(|c| c[1].parse().ok());
        let tags = extract_tags(raw_title);
        let title = TAG_RE.replace_all(raw_title, "").trim().to_string();

        items.push(ChecklistItem {
            line: index,
            title,
            done,
            priority,
            project_id,
            due_date,
            tags,
        });
    }
    items
}

fn extract_blocks(content: &str) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    for captures in TIME_BLOCK_RE.captures_iter(content) {
        let minutes = |hour: &str, minute: &str| -> Option<u16> {
            let hour: u16 = hour.parse().ok()?;
            let minute: u16 = minute.parse().ok()?;
            if hour > 23 || minute > 59 {
                return None;
            }
            Some(hour * 60 + minute)
        };
        let (Some(start_minute), Some(end_minute)) = (
            minutes(&captures[1], &captures[2]),
            minutes(&captures[3], &captures[4]),
        ) else {
            continue;
        };
        let title = captures[5].trim().to_string();
        let kind = infer_block_kind(&title);
        blocks.push(TimeBlock {
            title,
            start_minute,
            end_minute,
            kind,
        });
    }
    blocks
}

fn extract_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for captures in TAG_RE.captures_iter(text) {
        let tag = captures[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn infer_block_kind(title: &str) -> BlockKind {
    let lower = title.to_lowercase();
    if lower.contains("meeting") || lower.contains("call") || lower.contains("sync") {
        BlockKind::Meeting
    } else if lower.contains("focus") || lower.contains("deep") || lower.contains("work") {
        BlockKind::DeepWork
    } else if lower.contains("break") || lower.contains("lunch") {
        BlockKind::Break
    } else if lower.contains("admin") || lower.contains("email") {
        BlockKind::Admin
    } else {
        BlockKind::Personal
    }
}

/// Every daily note, newest filename first. Unreadable notes are skipped with
/// a diagnostic.
pub fn load_daily_notes(root: &Path) -> Vec<NoteDocument> {
    let mut notes: Vec<NoteDocument> = list_record_files(&daily_dir(root), "md")
        .iter()
        .filter_map(|path| match parse_note(path) {
            Ok(note) => Some(note),
            Err(error) => {
                tracing::warn!(path = %path.to_string_lossy(), error = %error, "skipping unreadable note");
                None
            }
        })
        .collect();
    notes.reverse();
    notes
}

/// The note named for today's date, when one exists.
pub fn load_today_note(root: &Path, today: NaiveDate) -> Option<NoteDocument> {
    let path = daily_dir(root).join(format!("{}.md", today.format("%Y-%m-%d")));
    if !path.exists() {
        return None;
    }
    match parse_note(&path) {
        Ok(note) => Some(note),
        Err(error) => {
            tracing::warn!(path = %path.to_string_lossy(), error = %error, "skipping unreadable note");
            None
        }
    }
}
