use super::{Outcome, PhaseExportRow, ProjectExportRow};
use crate::error::Result;
use rusqlite::{params, Connection};

/// Upsert exported projects into `projects_canonical`. Per-row failures are
/// logged and counted; the rest of the batch continues.
pub fn projects(conn: &Connection, rows: &[ProjectExportRow]) -> Result<Outcome> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO projects_canonical
         (projectId, projectName, owner, status, createdAt, updatedAt)
         VALUES (?1, ?2, ?3, ?4, datetime('now'), datetime('now'))",
    )?;

    let mut outcome = Outcome {
        records: rows.len() as u64,
        ..Outcome::default()
    };
    for row in rows {
        match stmt.execute(params![
            row.project_id,
            row.project_name,
            row.owner,
            row.status
        ]) {
            Ok(_) => outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!(project_id = %row.project_id, error = %e, "project insert failed");
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}

/// Upsert exported phases into `phases_canonical`.
pub fn phases(conn: &Connection, rows: &[PhaseExportRow]) -> Result<Outcome> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO phases_canonical
         (phaseId, phaseName, project_ref, status, RAG, startDate, endDate, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    let mut outcome = Outcome {
        records: rows.len() as u64,
        ..Outcome::default()
    };
    for row in rows {
        match stmt.execute(params![
            row.phase_id,
            row.phase_name,
            row.project_ref,
            row.status,
            row.rag,
            row.start_date,
            row.end_date,
            row.notes
        ]) {
            Ok(_) => outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!(phase_id = %row.phase_id, error = %e, "phase insert failed");
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
