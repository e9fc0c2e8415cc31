use super::{Outcome, PhaseExportRow};
use crate::error::Result;
use regex::Regex;
use rusqlite::{params, Connection};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Extraction patterns
// ---------------------------------------------------------------------------

static STEP_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// The legacy phase notes encode steps in several ad hoc formats: numbered
/// `StepTaskOutput` markers, bare `N.N Title` lines, `Step N.N: Title`
/// lines, and emoji task markers for done / planned / in-progress items.
fn step_patterns() -> &'static [Regex] {
    STEP_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)StepTaskOutput(\d+\.\d+)[^\n]*([^\n]*)").unwrap(),
            Regex::new(r"(\d+\.\d+)\s*([A-Za-z][^\n]*)").unwrap(),
            Regex::new(r"(?i)Step\s*(\d+\.\d+)[:\s]*([^\n]*)").unwrap(),
            Regex::new(r"✅\s*([^\n]+)").unwrap(),
            Regex::new(r"🔲\s*([^\n]+)").unwrap(),
            Regex::new(r"🔄\s*([^\n]+)").unwrap(),
        ]
    })
}

const MIN_NAME_LEN: usize = 10;
const MAX_NAME_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 1000;

// ---------------------------------------------------------------------------
// StepRecord / Extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step_id: String,
    pub step_name: String,
    pub phase_ref: String,
    pub project_ref: String,
    pub status: String,
    pub output_notes: String,
}

#[derive(Debug, Default)]
pub struct Extraction {
    /// Pattern matches seen, including ones dropped as too short.
    pub candidates: u64,
    pub steps: Vec<StepRecord>,
}

fn sanitize(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || *c == '_' || "-()[].,:;".contains(*c)
        })
        .take(MAX_NAME_LEN)
        .collect();
    kept.trim().to_string()
}

/// Scan phase notes for step markers and synthesize step records. Step ids
/// are `{phaseId}-{counter}` with the counter shared across all phases, as
/// in the legacy extraction.
pub fn extract(rows: &[PhaseExportRow]) -> Extraction {
    let mut extraction = Extraction::default();
    let mut counter: u64 = 0;

    for phase in rows {
        if phase.notes.is_empty() || phase.phase_id.is_empty() {
            continue;
        }
        for pattern in step_patterns() {
            for caps in pattern.captures_iter(&phase.notes) {
                counter += 1;
                extraction.candidates += 1;

                let raw: String = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let name = sanitize(&raw);
                if name.chars().count() <= MIN_NAME_LEN {
                    continue;
                }

                extraction.steps.push(StepRecord {
                    step_id: format!("{}-{}", phase.phase_id, counter),
                    step_name: name,
                    phase_ref: phase.phase_id.clone(),
                    project_ref: phase.project_ref.clone(),
                    status: phase.status.clone(),
                    output_notes: phase.notes.chars().take(MAX_NOTES_LEN).collect(),
                });
            }
        }
    }
    extraction
}

/// Extract steps from `rows` and upsert them into `steps_canonical`.
/// `records` in the outcome counts raw pattern matches; `succeeded` counts
/// inserted rows.
pub fn extract_into(conn: &Connection, rows: &[PhaseExportRow]) -> Result<Outcome> {
    let extraction = extract(rows);
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO steps_canonical
         (stepId, stepName, phase_ref, project_ref, status, outputNotes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    let mut outcome = Outcome {
        records: extraction.candidates,
        ..Outcome::default()
    };
    for step in &extraction.steps {
        match stmt.execute(params![
            step.step_id,
            step.step_name,
            step.phase_ref,
            step.project_ref,
            step.status,
            step.output_notes
        ]) {
            Ok(_) => outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!(step_id = %step.step_id, error = %e, "step insert failed");
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
