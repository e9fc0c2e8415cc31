use crate::error::{Result, WtError};
use crate::io;
use crate::workspace::WorkspaceClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// EntryKind
// ---------------------------------------------------------------------------

/// Governance entry category, tagged on the wire as `entryType`.
///
/// `CanonicalMigration` carries the outcome counts the migration pipeline
/// records; the other kinds are plain labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType")]
pub enum EntryKind {
    Decision,
    Implementation,
    Review,
    Rollback,
    #[serde(rename_all = "camelCase")]
    CanonicalMigration {
        resource: String,
        action: String,
        record_count: u64,
        success_count: u64,
        error_count: u64,
    },
    Note,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Decision => "decision",
            EntryKind::Implementation => "implementation",
            EntryKind::Review => "review",
            EntryKind::Rollback => "rollback",
            EntryKind::CanonicalMigration { .. } => "canonical_migration",
            EntryKind::Note => "note",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = WtError;

    /// Parse a payload-free kind from CLI input. `canonical_migration`
    /// entries are emitted by the migration pipeline, not hand-written.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "decision" => Ok(EntryKind::Decision),
            "implementation" => Ok(EntryKind::Implementation),
            "review" => Ok(EntryKind::Review),
            "rollback" => Ok(EntryKind::Rollback),
            "note" => Ok(EntryKind::Note),
            _ => Err(WtError::InvalidEntryType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// GovernanceEntry
// ---------------------------------------------------------------------------

/// One immutable line in the governance log.
///
/// Shared required fields plus a tagged kind; call-site-specific data goes
/// under `details`, which accepts any JSON shape. Referential integrity of
/// `projectRef`/`phaseRef` is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EntryKind,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl GovernanceEntry {
    /// Stamp a new entry with the current time.
    pub fn new(kind: EntryKind, summary: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            summary: summary.into(),
            project_ref: None,
            phase_ref: None,
            status: None,
            details: None,
        }
    }

    pub fn project(mut self, project_ref: impl Into<String>) -> Self {
        self.project_ref = Some(project_ref.into());
        self
    }

    pub fn phase(mut self, phase_ref: impl Into<String>) -> Self {
        self.phase_ref = Some(phase_ref.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ---------------------------------------------------------------------------
// VerifyReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_line: Option<usize>,
}

impl VerifyReport {
    pub fn ok(&self) -> bool {
        self.invalid == 0
    }
}

// ---------------------------------------------------------------------------
// GovernanceLog
// ---------------------------------------------------------------------------

/// Append-only JSON-lines governance log.
///
/// Each append writes exactly one line; lines are never mutated or deleted.
/// Ordering is physical line order. Concurrent appends from independent
/// processes are not locked — single-invocation usage is assumed.
pub struct GovernanceLog {
    path: PathBuf,
}

impl GovernanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `entry` to one compact JSON line and append it, creating the
    /// file and parent directories if absent. Failure propagates; no retry.
    pub fn append(&self, entry: &GovernanceEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        io::append_line(&self.path, &line)
    }

    /// Append locally, then mirror the entry into a workspace database.
    ///
    /// The remote write is best-effort: its failure is logged and does not
    /// roll back or fail the local append.
    pub fn append_with_remote(
        &self,
        entry: &GovernanceEntry,
        client: &WorkspaceClient,
        database_id: &str,
    ) -> Result<()> {
        self.append(entry)?;
        let properties = serde_json::to_value(entry)?;
        if let Err(e) = client.create_page(database_id, properties) {
            tracing::warn!(database_id, error = %e, "remote governance mirror failed");
        }
        Ok(())
    }

    /// Read the whole log as a linear event stream, in line order.
    ///
    /// A line that does not parse as a [`GovernanceEntry`] is an error carrying
    /// its 1-based line number.
    pub fn read_all(&self) -> Result<Vec<GovernanceEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(line)
                .map_err(|source| WtError::MalformedLogLine { line: i + 1, source })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<GovernanceEntry>> {
        let mut entries = self.read_all()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.split_off(skip))
    }

    /// Integrity pass: every line must parse as a JSON object. Unlike
    /// [`read_all`](Self::read_all) this accepts foreign entry shapes — the
    /// append-only contract promises valid JSON per line, nothing more.
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport {
            total: 0,
            valid: 0,
            invalid: 0,
            first_invalid_line: None,
        };
        if !self.path.exists() {
            return Ok(report);
        }
        let content = std::fs::read_to_string(&self.path)?;
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            report.total += 1;
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(_)) => report.valid += 1,
                _ => {
                    report.invalid += 1;
                    if report.first_invalid_line.is_none() {
                        report.first_invalid_line = Some(i + 1);
                    }
                }
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn log_in(dir: &TempDir) -> GovernanceLog {
        GovernanceLog::new(dir.path().join("logs/governance.jsonl"))
    }

    #[test]
    fn append_adds_exactly_one_line_that_roundtrips() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        let entry = GovernanceEntry::new(EntryKind::Decision, "use canonical schema")
            .project("WT-1")
            .phase("WT-1.2")
            .status("Approved")
            .details(json!({"approvedBy": "alice", "links": ["ADR-7"]}));
        log.append(&entry).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 1);

        let parsed: GovernanceEntry = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn n_appends_yield_n_lines_in_call_order() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);

        for i in 0..5 {
            let entry = GovernanceEntry::new(EntryKind::Note, format!("entry {i}"));
            log.append(&entry).unwrap();
        }

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 5);

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 5);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.summary, format!("entry {i}"));
        }
    }

    #[test]
    fn wire_shape_is_tagged_camel_case() {
        let entry = GovernanceEntry::new(EntryKind::Implementation, "wired up staging db")
            .project("WT-3");
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains("\"entryType\":\"Implementation\""));
        assert!(line.contains("\"projectRef\":\"WT-3\""));
        assert!(!line.contains("phaseRef"), "unset optionals stay off the wire");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn canonical_migration_payload_roundtrips() {
        let entry = GovernanceEntry::new(
            EntryKind::CanonicalMigration {
                resource: "phases_canonical".to_string(),
                action: "backfill".to_string(),
                record_count: 42,
                success_count: 40,
                error_count: 2,
            },
            "phases backfill",
        );
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains("\"entryType\":\"CanonicalMigration\""));
        assert!(line.contains("\"recordCount\":42"));
        let parsed: GovernanceEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(log_in(&dir).read_all().unwrap().is_empty());
    }

    #[test]
    fn read_all_reports_malformed_line_number() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append(&GovernanceEntry::new(EntryKind::Note, "fine")).unwrap();
        crate::io::append_line(log.path(), "not json at all").unwrap();

        match log.read_all() {
            Err(WtError::MalformedLogLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedLogLine, got {other:?}"),
        }
    }

    #[test]
    fn tail_returns_last_n_oldest_first() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        for i in 0..10 {
            log.append(&GovernanceEntry::new(EntryKind::Note, format!("e{i}")))
                .unwrap();
        }
        let last = log.tail(3).unwrap();
        assert_eq!(last.len(), 3);
        assert_eq!(last[0].summary, "e7");
        assert_eq!(last[2].summary, "e9");
    }

    #[test]
    fn verify_accepts_foreign_shapes_and_flags_garbage() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.append(&GovernanceEntry::new(EntryKind::Note, "ours")).unwrap();
        // A foreign writer's entry: valid JSON object, not our schema.
        crate::io::append_line(log.path(), r#"{"event_type":"legacy","user_id":"system"}"#)
            .unwrap();
        crate::io::append_line(log.path(), "{{broken").unwrap();

        let report = log.verify().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.valid, 2);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.first_invalid_line, Some(3));
        assert!(!report.ok());
    }

    #[test]
    fn entry_kind_labels_and_parse() {
        assert_eq!(EntryKind::Decision.label(), "decision");
        assert_eq!(
            "rollback".parse::<EntryKind>().unwrap(),
            EntryKind::Rollback
        );
        assert!(matches!(
            "canonical_migration".parse::<EntryKind>(),
            Err(WtError::InvalidEntryType(_))
        ));
    }

    #[test]
    fn remote_mirror_failure_does_not_fail_local_append() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/pages")
            .with_status(500)
            .with_body("boom")
            .create();

        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        let client = WorkspaceClient::new(server.url(), "test-token");

        let entry = GovernanceEntry::new(EntryKind::Decision, "mirrored");
        log.append_with_remote(&entry, &client, "db-1").unwrap();

        mock.assert();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn remote_mirror_posts_entry_as_page() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/pages")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"properties": {"entryType": "Decision", "summary": "mirrored"}}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"id": "page-1"}"#)
            .create();

        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        let client = WorkspaceClient::new(server.url(), "test-token");

        let entry = GovernanceEntry::new(EntryKind::Decision, "mirrored");
        log.append_with_remote(&entry, &client, "db-1").unwrap();
        mock.assert();
    }
}
