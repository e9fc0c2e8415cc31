use crate::error::Result;
use rusqlite::Connection;

/// Create the four canonical staging tables. Idempotent.
pub fn create(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects_canonical (
            projectId   TEXT PRIMARY KEY,
            projectName TEXT,
            owner       TEXT,
            status      TEXT,
            createdAt   TEXT,
            updatedAt   TEXT
        );

        CREATE TABLE IF NOT EXISTS phases_canonical (
            phaseId     TEXT PRIMARY KEY,
            phaseName   TEXT,
            project_ref TEXT,
            status      TEXT,
            RAG         TEXT,
            startDate   TEXT,
            endDate     TEXT,
            notes       TEXT
        );

        CREATE TABLE IF NOT EXISTS steps_canonical (
            stepId      TEXT PRIMARY KEY,
            stepName    TEXT,
            phase_ref   TEXT,
            project_ref TEXT,
            status      TEXT,
            outputNotes TEXT
        );

        CREATE TABLE IF NOT EXISTS comms_canonical (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp      TEXT,
            agentType      TEXT,
            eventType      TEXT,
            projectId      TEXT,
            phaseId        TEXT,
            messagePayload TEXT
        );
        "#,
    )?;
    Ok(())
}
