//! Canonical migration pipeline: JSON exports → SQLite staging tables.
//!
//! Every operation appends a `CanonicalMigration` governance entry recording
//! resource, action, and outcome counts. Per-row failures are counted and
//! logged, not fatal; a failure partway leaves already-written rows in place.

pub mod backfill;
pub mod comms;
pub mod schema;
pub mod steps;
pub mod validate;

use crate::error::{Result, WtError};
use crate::governance::{EntryKind, GovernanceEntry};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Staging database
// ---------------------------------------------------------------------------

/// Open (or create) the SQLite staging database.
pub fn open_staging(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Connection::open(path)?)
}

// ---------------------------------------------------------------------------
// Export parsing
// ---------------------------------------------------------------------------

/// Parse a `{"data": [...]}` export file into typed rows.
pub fn load_export<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| WtError::MalformedExport {
            path: path.display().to_string(),
        })?;
    let rows = serde_json::from_value(Value::Array(data.clone()))?;
    Ok(rows)
}

/// Project row as exported from the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectExportRow {
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "projectName", default)]
    pub project_name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default = "default_project_status")]
    pub status: String,
}

fn default_project_status() -> String {
    "Planning".to_string()
}

/// Phase row as exported from the workspace. Field names follow the export
/// format, including the `WT Projects` relation column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseExportRow {
    #[serde(rename = "phaseid")]
    pub phase_id: String,
    #[serde(rename = "phasename", default)]
    pub phase_name: String,
    #[serde(rename = "WT Projects", default)]
    pub project_ref: String,
    #[serde(default = "default_phase_status")]
    pub status: String,
    #[serde(rename = "RAG", default)]
    pub rag: String,
    #[serde(rename = "startDate", default)]
    pub start_date: String,
    #[serde(rename = "endDate", default)]
    pub end_date: String,
    #[serde(default)]
    pub notes: String,
}

fn default_phase_status() -> String {
    "Planned".to_string()
}

/// One agent-communication entry from the legacy log export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentLogRow {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub runtime_context: Option<Value>,
}

// ---------------------------------------------------------------------------
// AgentType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentType {
    Claude,
    Gizmo,
    System,
    Unknown,
}

impl AgentType {
    /// Legacy `user_role` → agent mapping.
    pub fn from_role(role: &str) -> AgentType {
        match role {
            "developer" | "assistant" => AgentType::Claude,
            "architect" => AgentType::Gizmo,
            "system" => AgentType::System,
            _ => AgentType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Claude => "Claude",
            AgentType::Gizmo => "Gizmo",
            AgentType::System => "System",
            AgentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Row-level result counts for one migration operation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Outcome {
    pub records: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Governance entry for a completed migration operation, carrying a fresh
/// run id and the source file under `details`.
pub fn migration_entry(
    resource: &str,
    action: &str,
    outcome: &Outcome,
    source: &str,
) -> GovernanceEntry {
    GovernanceEntry::new(
        EntryKind::CanonicalMigration {
            resource: resource.to_string(),
            action: action.to_string(),
            record_count: outcome.records,
            success_count: outcome.succeeded,
            error_count: outcome.failed,
        },
        format!("{resource} {action}"),
    )
    .status(if outcome.failed == 0 { "Success" } else { "Partial" })
    .details(json!({
        "runId": Uuid::new_v4().to_string(),
        "source": source,
        "phase": "staging",
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_export_reads_data_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(
            &path,
            r#"{"data":[{"projectId":"WT-1","projectName":"Wombat","extraField":42}]}"#,
        )
        .unwrap();

        let rows: Vec<ProjectExportRow> = load_export(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_id, "WT-1");
        assert_eq!(rows[0].owner, "");
        assert_eq!(rows[0].status, "Planning");
    }

    #[test]
    fn load_export_without_data_key_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"rows":[]}"#).unwrap();

        assert!(matches!(
            load_export::<ProjectExportRow>(&path),
            Err(WtError::MalformedExport { .. })
        ));
    }

    #[test]
    fn phase_row_maps_relation_column() {
        let json = r#"{"phaseid":"WT-1.1","phasename":"Setup","WT Projects":"WT-1"}"#;
        let row: PhaseExportRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.project_ref, "WT-1");
        assert_eq!(row.status, "Planned");
        assert_eq!(row.rag, "");
    }

    #[test]
    fn agent_role_mapping() {
        assert_eq!(AgentType::from_role("developer"), AgentType::Claude);
        assert_eq!(AgentType::from_role("assistant"), AgentType::Claude);
        assert_eq!(AgentType::from_role("architect"), AgentType::Gizmo);
        assert_eq!(AgentType::from_role("system"), AgentType::System);
        assert_eq!(AgentType::from_role("intern"), AgentType::Unknown);
    }

    #[test]
    fn migration_entry_carries_counts_and_run_id() {
        let outcome = Outcome {
            records: 10,
            succeeded: 9,
            failed: 1,
        };
        let entry = migration_entry("projects_canonical", "backfill", &outcome, "projects.json");
        assert_eq!(entry.status.as_deref(), Some("Partial"));
        match &entry.kind {
            EntryKind::CanonicalMigration {
                record_count,
                success_count,
                error_count,
                ..
            } => {
                assert_eq!(*record_count, 10);
                assert_eq!(*success_count, 9);
                assert_eq!(*error_count, 1);
            }
            other => panic!("expected CanonicalMigration, got {other:?}"),
        }
        let details = entry.details.unwrap();
        assert!(details["runId"].as_str().unwrap().len() > 30);
        assert_eq!(details["source"], "projects.json");
    }
}
