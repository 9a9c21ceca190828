//! Audit logging — append-only record of filesystem mutations.
//!
//! Every successful mutating tool call appends one JSON line to the audit
//! log before its success is reported. If the append fails the mutation is
//! reported as failed, so the log never understates what happened.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when the audit log cannot be opened or appended to.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to open audit log '{path}': {reason}")]
    Open { path: String, reason: String },

    #[error("failed to append audit record: {reason}")]
    Append { reason: String },

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single audit log entry describing one filesystem mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub summary: String,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        tool_name: impl Into<String>,
        path: Option<PathBuf>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            tool_name: tool_name.into(),
            path,
            summary: summary.into(),
        }
    }
}

/// Append-only audit log backed by a JSON-lines file.
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").field("path", &self.path).finish()
    }
}

impl AuditLog {
    /// Open the log at `path` for appending, creating the file and any
    /// missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| AuditError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Where the log lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line and flush it.
    pub fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock().map_err(|_| AuditError::Append {
            reason: "audit log lock poisoned".into(),
        })?;
        writeln!(file, "{line}").map_err(|e| AuditError::Append {
            reason: e.to_string(),
        })?;
        file.flush().map_err(|e| AuditError::Append {
            reason: e.to_string(),
        })?;
        tracing::debug!(tool = %record.tool_name, "audit record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/audit.jsonl");
        let log = AuditLog::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(log.path(), path);
    }

    #[test]
    fn record_appends_one_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        let record = AuditRecord::new("write", Some(PathBuf::from("/ws/a.txt")), "created a.txt");
        log.record(&record).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.tool_name, "write");
        assert_eq!(parsed.path, Some(PathBuf::from("/ws/a.txt")));
        assert_eq!(parsed.summary, "created a.txt");
    }

    #[test]
    fn records_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        log.record(&AuditRecord::new("write", None, "first")).unwrap();
        log.record(&AuditRecord::new("edit", None, "second")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let summaries: Vec<String> = contents
            .lines()
            .map(|l| serde_json::from_str::<AuditRecord>(l).unwrap().summary)
            .collect();
        assert_eq!(summaries, vec!["first", "second"]);
    }

    #[test]
    fn missing_path_is_omitted_from_json() {
        let record = AuditRecord::new("bash", None, "ran a command");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"path\""));
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let log = AuditLog::open(&path).unwrap();
            log.record(&AuditRecord::new("write", None, "before reopen"))
                .unwrap();
        }
        {
            let log = AuditLog::open(&path).unwrap();
            log.record(&AuditRecord::new("write", None, "after reopen"))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
