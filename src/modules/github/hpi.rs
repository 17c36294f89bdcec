//! Local GitHub activity read from `ghexport` dumps on disk, the "hpi" provider.
//!
//! A dump is one JSON file, either an object with an `events` array or a bare array of
//! GitHub API events. When the configured path is a directory the most recently modified
//! `*.json` in it wins.
//! Records that cannot be read are returned inline as [`SourceItem::Error`] so one bad entry
//! never hides the rest of the export.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::NewEvent;

pub const HPI_EVENT_TYPE: &str = "hpi";

#[derive(Debug, Error)]
pub enum HpiError {
    #[error("GitHub export not found at {0}. Run ghexport to create it or switch to provider=api.")]
    MissingDependency(PathBuf),

    #[error("HPI not configured. Set hpi_path or SYNAPSESYNC_HPI_EXPORT_PATH, or switch to provider=api.")]
    NotConfigured,

    #[error("HPI import failed: {0}. Check the export or switch to provider=api.")]
    ImportFailed(String),

    /// The export location exists but holds nothing to read. Not a failure for callers.
    #[error("HPI export is empty")]
    Empty,
}

/// One activity record from the local export.
#[derive(Debug, Clone, PartialEq)]
pub struct HpiRecord {
    pub dt: DateTime<Utc>,
    pub summary: String,
    pub event_id: String,
    pub kind: String,
    pub link: Option<String>,
    pub body: Option<String>,
}

impl HpiRecord {
    pub fn into_event(self, module_id: &str) -> NewEvent {
        let metadata = json!({
            "source": "hpi",
            "kind": self.kind,
            "event_id": self.event_id,
            "link": self.link,
            "body": self.body,
        });
        NewEvent::new(self.dt, module_id, HPI_EVENT_TYPE, self.summary).with_metadata(metadata)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceItem {
    Record(HpiRecord),
    Error(String),
}

pub trait LocalEventSource: Send + Sync {
    fn read_events(&self, export_path: Option<&Path>) -> Result<Vec<SourceItem>, HpiError>;
}

/// Reads `ghexport` JSON dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhExportSource;

impl LocalEventSource for GhExportSource {
    fn read_events(&self, export_path: Option<&Path>) -> Result<Vec<SourceItem>, HpiError> {
        let path = export_path.ok_or(HpiError::NotConfigured)?;
        if !path.exists() {
            return Err(HpiError::MissingDependency(path.to_path_buf()));
        }

        let file = if path.is_dir() {
            latest_export(path)?
        } else {
            path.to_path_buf()
        };

        let raw = std::fs::read_to_string(&file)
            .map_err(|e| HpiError::ImportFailed(format!("{}: {}", file.display(), e)))?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| HpiError::ImportFailed(format!("{}: {}", file.display(), e)))?;

        let events = match document {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("events") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(HpiError::ImportFailed(format!(
                        "{}: no events array",
                        file.display()
                    )))
                }
            },
            _ => {
                return Err(HpiError::ImportFailed(format!(
                    "{}: unexpected document",
                    file.display()
                )))
            }
        };

        Ok(events.iter().map(parse_item).collect())
    }
}

/// Most recently modified `*.json` file; ties go to the last file name.
fn latest_export(dir: &Path) -> Result<PathBuf, HpiError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| HpiError::ImportFailed(format!("{}: {}", dir.display(), e)))?;

    entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| {
            let modified = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .max()
        .map(|(_, path)| path)
        .ok_or(HpiError::Empty)
}

fn parse_item(item: &Value) -> SourceItem {
    match parse_record(item) {
        Ok(record) => SourceItem::Record(record),
        Err(message) => SourceItem::Error(message),
    }
}

fn parse_record(item: &Value) -> Result<HpiRecord, String> {
    let event_id = match item.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err("export event without id".to_string()),
    };
    let created_at = item
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("export event {} has no created_at", event_id))?;
    let dt = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| {
            format!(
                "export event {}: bad created_at {:?}: {}",
                event_id, created_at, e
            )
        })?
        .with_timezone(&Utc);

    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("event")
        .to_string();
    let repo = item.pointer("/repo/name").and_then(Value::as_str);

    let summary = match repo {
        Some(repo) => format!("{} {}", kind, repo),
        None => kind.clone(),
    };

    Ok(HpiRecord {
        dt,
        summary,
        event_id,
        link: repo.map(|r| format!("https://github.com/{}", r)),
        body: event_body(item),
        kind,
    })
}

/// Commit messages for pushes, the action verb for everything else.
fn event_body(item: &Value) -> Option<String> {
    let payload = item.get("payload")?;
    if let Some(commits) = payload.get("commits").and_then(Value::as_array) {
        let messages: Vec<&str> = commits
            .iter()
            .filter_map(|c| c.get("message").and_then(Value::as_str))
            .collect();
        if !messages.is_empty() {
            return Some(messages.join("\n"));
        }
    }
    payload
        .get("action")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
