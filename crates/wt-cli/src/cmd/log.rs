use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::Path;
use wt_core::{
    config::Config,
    governance::{EntryKind, GovernanceEntry, GovernanceLog},
    workspace::WorkspaceClient,
};

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Append one entry to the governance log
    Append {
        summary: String,
        /// Entry type: decision, implementation, review, rollback, note
        #[arg(long = "type", default_value = "note")]
        entry_type: String,
        /// Project reference (free-form identifier, not validated)
        #[arg(long)]
        project: Option<String>,
        /// Phase reference (free-form identifier, not validated)
        #[arg(long)]
        phase: Option<String>,
        /// Outcome label
        #[arg(long)]
        status: Option<String>,
        /// Extra detail field as key=value; repeatable
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Also mirror the entry into the configured workspace database
        #[arg(long)]
        push: bool,
    },
    /// List entries, newest last
    List {
        #[arg(long = "type")]
        entry_type: Option<String>,
        #[arg(long)]
        project: Option<String>,
        /// Show only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the last N entries
    Tail {
        #[arg(short = 'n', long, default_value = "10")]
        lines: usize,
    },
    /// Check that every log line is valid JSON
    Verify,
}

pub fn run(root: &Path, subcmd: LogSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        LogSubcommand::Append {
            summary,
            entry_type,
            project,
            phase,
            status,
            fields,
            push,
        } => append(
            root, &summary, &entry_type, project, phase, status, &fields, push, json,
        ),
        LogSubcommand::List {
            entry_type,
            project,
            limit,
        } => list(root, entry_type.as_deref(), project.as_deref(), limit, json),
        LogSubcommand::Tail { lines } => tail(root, lines, json),
        LogSubcommand::Verify => verify(root, json),
    }
}

fn open_log(root: &Path) -> anyhow::Result<GovernanceLog> {
    let cfg = Config::load(root)?;
    Ok(GovernanceLog::new(cfg.log_path(root)))
}

fn parse_fields(fields: &[String]) -> anyhow::Result<Option<Value>> {
    if fields.is_empty() {
        return Ok(None);
    }
    let mut map = Map::new();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("invalid --field '{field}': expected key=value"))?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Some(Value::Object(map)))
}

#[allow(clippy::too_many_arguments)]
fn append(
    root: &Path,
    summary: &str,
    entry_type: &str,
    project: Option<String>,
    phase: Option<String>,
    status: Option<String>,
    fields: &[String],
    push: bool,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let log = GovernanceLog::new(cfg.log_path(root));

    let kind: EntryKind = entry_type.parse()?;
    let mut entry = GovernanceEntry::new(kind, summary);
    entry.project_ref = project;
    entry.phase_ref = phase;
    entry.status = status;
    entry.details = parse_fields(fields)?;

    if push {
        let database_id = cfg
            .workspace
            .governance_database_id
            .clone()
            .context("workspace.governance_database_id not configured")?;
        let client = WorkspaceClient::from_config(&cfg)?;
        log.append_with_remote(&entry, &client, &database_id)
            .context("failed to append governance entry")?;
    } else {
        log.append(&entry).context("failed to append governance entry")?;
    }

    if json {
        print_json(&serde_json::json!({
            "path": log.path(),
            "entryType": entry.kind.label(),
            "summary": entry.summary,
        }))?;
    } else {
        println!("Appended {} entry to {}.", entry.kind, log.path().display());
    }
    Ok(())
}

fn entry_rows(entries: &[GovernanceEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.kind.label().to_string(),
                e.project_ref.clone().unwrap_or_default(),
                e.phase_ref.clone().unwrap_or_default(),
                e.status.clone().unwrap_or_default(),
                e.summary.clone(),
            ]
        })
        .collect()
}

fn list(
    root: &Path,
    entry_type: Option<&str>,
    project: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let log = open_log(root)?;
    let mut entries: Vec<_> = log
        .read_all()?
        .into_iter()
        .filter(|e| entry_type.map_or(true, |t| e.kind.label() == t))
        .filter(|e| project.map_or(true, |p| e.project_ref.as_deref() == Some(p)))
        .collect();
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No matching governance entries.");
        return Ok(());
    }
    print_table(
        &["TIMESTAMP", "TYPE", "PROJECT", "PHASE", "STATUS", "SUMMARY"],
        entry_rows(&entries),
    );
    Ok(())
}

fn tail(root: &Path, lines: usize, json: bool) -> anyhow::Result<()> {
    let log = open_log(root)?;
    let entries = log.tail(lines)?;
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("Governance log is empty.");
        return Ok(());
    }
    print_table(
        &["TIMESTAMP", "TYPE", "PROJECT", "PHASE", "STATUS", "SUMMARY"],
        entry_rows(&entries),
    );
    Ok(())
}

fn verify(root: &Path, json: bool) -> anyhow::Result<()> {
    let log = open_log(root)?;
    let report = log.verify()?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "{}: {} lines, {} valid, {} invalid",
            log.path().display(),
            report.total,
            report.valid,
            report.invalid
        );
    }
    if !report.ok() {
        anyhow::bail!(
            "governance log has {} invalid line(s), first at line {}",
            report.invalid,
            report.first_invalid_line.unwrap_or(0)
        );
    }
    Ok(())
}
