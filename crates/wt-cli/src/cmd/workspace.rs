use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;
use std::path::Path;
use wt_core::{config::Config, governance::GovernanceLog, workspace::WorkspaceClient};

#[derive(Subcommand)]
pub enum WorkspaceSubcommand {
    /// Query a workspace database and print the response
    Query {
        database_id: String,
        /// Follow pagination and print all results
        #[arg(long)]
        all: bool,
        /// Filter object as inline JSON
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a database under a parent page
    CreateDb {
        parent_page_id: String,
        title: String,
        /// Database schema as inline JSON
        #[arg(long)]
        properties: Option<String>,
    },
    /// Mirror local governance entries into a workspace database
    PushLog {
        /// Target database (default: workspace.governance_database_id)
        database_id: Option<String>,
        /// Push only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(root: &Path, subcmd: WorkspaceSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let client = WorkspaceClient::from_config(&cfg)?;

    match subcmd {
        WorkspaceSubcommand::Query {
            database_id,
            all,
            filter,
        } => {
            let filter: Option<Value> = filter
                .map(|f| serde_json::from_str(&f))
                .transpose()
                .context("--filter is not valid JSON")?;
            if all {
                let results = client.query_database_all(&database_id, filter.as_ref())?;
                print_json(&results)
            } else {
                let resp = client.query_database(&database_id, filter.as_ref(), None)?;
                print_json(&resp)
            }
        }
        WorkspaceSubcommand::CreateDb {
            parent_page_id,
            title,
            properties,
        } => {
            let properties: Value = match properties {
                Some(p) => serde_json::from_str(&p).context("--properties is not valid JSON")?,
                None => serde_json::json!({ "Name": { "title": {} } }),
            };
            let resp = client.create_database(&parent_page_id, &title, properties)?;
            if json {
                print_json(&resp)?;
            } else {
                println!(
                    "Created database '{}' ({}).",
                    title,
                    resp.get("id").and_then(Value::as_str).unwrap_or("?")
                );
            }
            Ok(())
        }
        WorkspaceSubcommand::PushLog { database_id, limit } => {
            let database_id = database_id
                .or_else(|| cfg.workspace.governance_database_id.clone())
                .context("no database id given and workspace.governance_database_id not configured")?;
            push_log(root, &cfg, &client, &database_id, limit, json)
        }
    }
}

/// Push is best-effort per entry: a failed page write is logged and counted,
/// and the remaining entries still go out.
fn push_log(
    root: &Path,
    cfg: &Config,
    client: &WorkspaceClient,
    database_id: &str,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let log = GovernanceLog::new(cfg.log_path(root));
    let entries = match limit {
        Some(n) => log.tail(n)?,
        None => log.read_all()?,
    };

    let mut pushed: u64 = 0;
    let mut failed: u64 = 0;
    for entry in &entries {
        let properties = serde_json::to_value(entry)?;
        match client.create_page(database_id, properties) {
            Ok(_) => pushed += 1,
            Err(e) => {
                tracing::warn!(database_id, error = %e, "governance push failed");
                failed += 1;
            }
        }
    }

    if json {
        print_json(&serde_json::json!({
            "databaseId": database_id,
            "pushed": pushed,
            "failed": failed,
        }))?;
    } else {
        println!("Pushed {pushed} of {} entries to {database_id} ({failed} failed).", entries.len());
    }
    Ok(())
}
