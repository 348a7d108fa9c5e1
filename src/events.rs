//! Session event log for cascade.
//!
//! Append-only NDJSON log (one JSON object per line) written into the
//! session directory. Each event records:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (session_start, generate, outcome, ...)
//! - `actor`: the operator string (`user@host`)
//! - `document`: optional prompt document name
//! - `details`: freeform object with action-specific details

use crate::error::{CascadeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Session directory created, documents discovered.
    SessionStart,
    /// Execution plan approved (interactively or by default).
    PlanApproved,
    /// Generation request issued.
    Generate,
    /// Generation request failed; routed back to the approval loop.
    GenerateFailed,
    /// Terminal outcome recorded for a document.
    Outcome,
    /// Session finished (all documents processed or stopped).
    SessionEnd,
}

/// A single logged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp.
    pub ts: DateTime<Utc>,
    /// The action performed.
    pub action: EventAction,
    /// The operator string (e.g. `user@HOST`).
    pub actor: String,
    /// Prompt document name for document-scoped events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Freeform action-specific details.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Get the actor string for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Handle to a session's NDJSON event file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    actor: String,
}

impl EventLog {
    /// Create a log handle writing to `path`. The file is created on the
    /// first append.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            actor: actor_string(),
        }
    }

    /// Append one event line (create + append + fsync).
    pub fn append(
        &self,
        action: EventAction,
        document: Option<&str>,
        details: Value,
    ) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            action,
            actor: self.actor.clone(),
            document: document.map(|d| d.to_string()),
            details,
        };

        let json_line = serde_json::to_string(&event).map_err(|e| {
            CascadeError::UserError(format!("failed to serialize event to JSON: {}", e))
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                CascadeError::UserError(format!(
                    "failed to create events directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CascadeError::UserError(format!(
                    "failed to open events file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            CascadeError::UserError(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            CascadeError::UserError(format!(
                "failed to sync events file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn append_writes_one_parseable_line_per_event() {
        let temp = TempDir::new().unwrap();
        let log = EventLog::new(temp.path().join("events.ndjson"));

        log.append(EventAction::SessionStart, None, json!({"documents": 2}))
            .unwrap();
        log.append(
            EventAction::Outcome,
            Some("01-intro.md"),
            json!({"outcome": "accepted"}),
        )
        .unwrap();

        let content = std::fs::read_to_string(temp.path().join("events.ndjson")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, EventAction::SessionStart);
        assert!(first.document.is_none());
        assert_eq!(first.details["documents"], 2);

        let second: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.action, EventAction::Outcome);
        assert_eq!(second.document.as_deref(), Some("01-intro.md"));
    }

    #[test]
    fn actor_has_user_at_host_shape() {
        let temp = TempDir::new().unwrap();
        let log = EventLog::new(temp.path().join("events.ndjson"));
        log.append(EventAction::SessionEnd, None, Value::Null).unwrap();

        let content = std::fs::read_to_string(temp.path().join("events.ndjson")).unwrap();
        let event: Event = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert!(event.actor.contains('@'));
    }

    #[test]
    fn append_creates_missing_parent_directory() {
        let temp = TempDir::new().unwrap();
        let log = EventLog::new(temp.path().join("nested/events.ndjson"));
        log.append(EventAction::SessionStart, None, Value::Null).unwrap();
        assert!(temp.path().join("nested/events.ndjson").exists());
    }

    #[test]
    fn action_serializes_snake_case() {
        let json = serde_json::to_string(&EventAction::GenerateFailed).unwrap();
        assert_eq!(json, "\"generate_failed\"");
    }
}
