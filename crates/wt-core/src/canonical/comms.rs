use super::{AgentLogRow, AgentType, Outcome};
use crate::error::Result;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct CommsOutcome {
    pub outcome: Outcome,
    pub by_agent: BTreeMap<&'static str, u64>,
}

fn str_field<'a>(value: Option<&'a Value>, keys: &[&str]) -> Option<&'a str> {
    let obj = value?.as_object()?;
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
}

/// Project linkage may live in several places across the legacy exports.
fn project_id(row: &AgentLogRow) -> Option<String> {
    str_field(row.details.as_ref(), &["projectId", "resource_id"])
        .or_else(|| str_field(row.runtime_context.as_ref(), &["projectId"]))
        .map(str::to_string)
}

fn phase_id(row: &AgentLogRow) -> Option<String> {
    str_field(row.details.as_ref(), &["phase", "phaseId"])
        .or_else(|| str_field(row.runtime_context.as_ref(), &["phase"]))
        .map(str::to_string)
}

/// Merge legacy agent-communication entries into `comms_canonical`, mapping
/// the legacy `user_role` onto an agent type and extracting project/phase
/// linkage from the entry payload.
pub fn merge(conn: &Connection, rows: &[AgentLogRow]) -> Result<CommsOutcome> {
    let mut stmt = conn.prepare(
        "INSERT INTO comms_canonical
         (timestamp, agentType, eventType, projectId, phaseId, messagePayload)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    let mut result = CommsOutcome {
        outcome: Outcome {
            records: rows.len() as u64,
            ..Outcome::default()
        },
        by_agent: BTreeMap::new(),
    };

    for row in rows {
        let agent = AgentType::from_role(row.user_role.as_deref().unwrap_or(""));
        *result.by_agent.entry(agent.as_str()).or_insert(0) += 1;

        let payload = row
            .details
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();

        match stmt.execute(params![
            row.timestamp,
            agent.as_str(),
            row.event_type,
            project_id(row),
            phase_id(row),
            payload
        ]) {
            Ok(_) => result.outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!(error = %e, "comms insert failed");
                result.outcome.failed += 1;
            }
        }
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
