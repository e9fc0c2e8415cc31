use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use wt_core::canonical::{self, backfill, comms, schema, steps, validate, Outcome};
use wt_core::{config::Config, governance::GovernanceLog, io};

#[derive(Subcommand)]
pub enum MigrateSubcommand {
    /// Create the canonical staging tables
    InitSchema,
    /// Upsert a projects export into projects_canonical
    BackfillProjects { export: PathBuf },
    /// Upsert a phases export into phases_canonical
    BackfillPhases { export: PathBuf },
    /// Extract steps from phase notes into steps_canonical
    ExtractSteps { export: PathBuf },
    /// Merge an agent-log export into comms_canonical
    MergeComms { export: PathBuf },
    /// Check row counts and linkage across the staging tables
    Validate {
        /// Also write the full report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: MigrateSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let conn = canonical::open_staging(&cfg.staging_db(root))
        .context("failed to open staging database")?;
    schema::create(&conn)?;
    let log = GovernanceLog::new(cfg.log_path(root));

    match subcmd {
        MigrateSubcommand::InitSchema => {
            println!("Staging schema ready at {}.", cfg.staging_db(root).display());
            Ok(())
        }
        MigrateSubcommand::BackfillProjects { export } => {
            let rows: Vec<canonical::ProjectExportRow> = canonical::load_export(&export)?;
            let outcome = backfill::projects(&conn, &rows)?;
            record(&log, "projects_canonical", "backfill", &outcome, &export)?;
            report_outcome("projects", &outcome, json)
        }
        MigrateSubcommand::BackfillPhases { export } => {
            let rows: Vec<canonical::PhaseExportRow> = canonical::load_export(&export)?;
            let outcome = backfill::phases(&conn, &rows)?;
            record(&log, "phases_canonical", "backfill", &outcome, &export)?;
            report_outcome("phases", &outcome, json)
        }
        MigrateSubcommand::ExtractSteps { export } => {
            let rows: Vec<canonical::PhaseExportRow> = canonical::load_export(&export)?;
            let outcome = steps::extract_into(&conn, &rows)?;
            record(&log, "steps_canonical", "extract", &outcome, &export)?;
            report_outcome("steps", &outcome, json)
        }
        MigrateSubcommand::MergeComms { export } => {
            let rows: Vec<canonical::AgentLogRow> = canonical::load_export(&export)?;
            let result = comms::merge(&conn, &rows)?;
            record(
                &log,
                "comms_canonical",
                "merge_communications",
                &result.outcome,
                &export,
            )?;
            if json {
                print_json(&serde_json::json!({
                    "outcome": result.outcome,
                    "agentDistribution": result.by_agent,
                }))?;
            } else {
                report_outcome("comms", &result.outcome, false)?;
                for (agent, count) in &result.by_agent {
                    println!("  {agent}: {count}");
                }
            }
            Ok(())
        }
        MigrateSubcommand::Validate { report } => {
            let result = validate::run(&conn)?;
            if let Some(path) = report {
                let data = serde_json::to_string_pretty(&result)?;
                io::atomic_write(&path, data.as_bytes())?;
            }
            if json {
                print_json(&result)?;
            } else {
                for (table, count) in &result.counts {
                    println!("{table}: {count} rows");
                }
                println!("orphaned phases: {}", result.orphaned_phases);
                println!("orphaned steps: {}", result.orphaned_steps);
                println!("orphaned comms: {}", result.orphaned_comms);
                println!(
                    "status: {}",
                    if result.passed() { "PASS" } else { "WARNINGS" }
                );
            }
            if !result.passed() {
                anyhow::bail!("validation found {} linkage issue(s)", result.total_issues);
            }
            Ok(())
        }
    }
}

/// Every migration operation leaves a governance entry behind.
fn record(
    log: &GovernanceLog,
    resource: &str,
    action: &str,
    outcome: &Outcome,
    source: &Path,
) -> anyhow::Result<()> {
    let entry = canonical::migration_entry(resource, action, outcome, &source.display().to_string());
    log.append(&entry).context("failed to append governance entry")?;
    Ok(())
}

fn report_outcome(what: &str, outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(outcome)?;
    } else {
        println!(
            "Migrated {} {what}: {} succeeded, {} failed.",
            outcome.records, outcome.succeeded, outcome.failed
        );
    }
    Ok(())
}
