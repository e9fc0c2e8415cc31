use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pass,
    Warnings,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<Utc>,
    pub counts: BTreeMap<String, i64>,
    pub orphaned_phases: i64,
    pub orphaned_steps: i64,
    pub orphaned_comms: i64,
    pub agent_distribution: BTreeMap<String, i64>,
    pub sample_projects: Vec<SampleProject>,
    pub total_issues: i64,
    pub status: ValidationStatus,
}

#[derive(Debug, Serialize)]
pub struct SampleProject {
    pub project_id: String,
    pub project_name: String,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Pass
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

const TABLES: &[&str] = &[
    "projects_canonical",
    "phases_canonical",
    "steps_canonical",
    "comms_canonical",
];

/// Row counts, orphan checks, and agent distribution over the staging
/// tables. Orphans are entries whose project/phase reference points at
/// nothing — the canonical schema does not enforce foreign keys, so this is
/// the only linkage check.
pub fn run(conn: &Connection) -> Result<ValidationReport> {
    let mut counts = BTreeMap::new();
    for table in TABLES {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        counts.insert(table.to_string(), count);
    }

    let orphaned_phases: i64 = conn.query_row(
        "SELECT COUNT(*) FROM phases_canonical p
         LEFT JOIN projects_canonical pr ON p.project_ref = pr.projectId
         WHERE pr.projectId IS NULL AND p.project_ref IS NOT NULL AND p.project_ref != ''",
        [],
        |r| r.get(0),
    )?;

    let orphaned_steps: i64 = conn.query_row(
        "SELECT COUNT(*) FROM steps_canonical s
         LEFT JOIN phases_canonical p ON s.phase_ref = p.phaseId
         WHERE p.phaseId IS NULL AND s.phase_ref IS NOT NULL AND s.phase_ref != ''",
        [],
        |r| r.get(0),
    )?;

    let orphaned_comms: i64 = conn.query_row(
        "SELECT COUNT(*) FROM comms_canonical c
         LEFT JOIN projects_canonical p ON c.projectId = p.projectId
         WHERE c.projectId IS NOT NULL AND p.projectId IS NULL",
        [],
        |r| r.get(0),
    )?;

    let mut agent_distribution = BTreeMap::new();
    let mut stmt =
        conn.prepare("SELECT agentType, COUNT(*) FROM comms_canonical GROUP BY agentType")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        agent_distribution.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
    }

    let mut stmt =
        conn.prepare("SELECT projectId, projectName FROM projects_canonical LIMIT 5")?;
    let sample_projects = stmt
        .query_map([], |row| {
            Ok(SampleProject {
                project_id: row.get(0)?,
                project_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_issues = orphaned_phases + orphaned_steps + orphaned_comms;
    Ok(ValidationReport {
        timestamp: Utc::now(),
        counts,
        orphaned_phases,
        orphaned_steps,
        orphaned_comms,
        agent_distribution,
        sample_projects,
        total_issues,
        status: if total_issues == 0 {
            ValidationStatus::Pass
        } else {
            ValidationStatus::Warnings
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
