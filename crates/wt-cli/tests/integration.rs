use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wt(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wt").unwrap();
    cmd.current_dir(dir.path()).env("WT_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    wt(dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// wt init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    wt(&dir).arg("init").assert().success();

    assert!(dir.path().join(".wt").is_dir());
    assert!(dir.path().join(".wt/config.yaml").exists());
    assert!(dir.path().join("logs").is_dir());

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".wt/staging.db"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    wt(&dir).arg("init").assert().success();
    wt(&dir).arg("init").assert().success();

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert_eq!(
        gitignore.lines().filter(|l| *l == ".wt/staging.db").count(),
        1
    );
}

// ---------------------------------------------------------------------------
// wt log
// ---------------------------------------------------------------------------

#[test]
fn log_append_adds_exactly_one_line() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args([
            "log",
            "append",
            "adopted canonical schema",
            "--type",
            "decision",
            "--project",
            "WT-1",
            "--status",
            "Approved",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("logs/governance.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 1);

    let entry: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(entry["entryType"], "Decision");
    assert_eq!(entry["summary"], "adopted canonical schema");
    assert_eq!(entry["projectRef"], "WT-1");
    assert_eq!(entry["status"], "Approved");
    assert!(entry["timestamp"].is_string());
}

#[test]
fn log_appends_accumulate_in_order() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    for i in 0..4 {
        wt(&dir)
            .args(["log", "append", &format!("entry {i}")])
            .assert()
            .success();
    }

    let content = std::fs::read_to_string(dir.path().join("logs/governance.jsonl")).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    for (i, line) in lines.iter().enumerate() {
        let entry: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(entry["summary"], format!("entry {i}"));
    }
}

#[test]
fn log_append_with_fields_nests_details() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args([
            "log",
            "append",
            "rolled back staging import",
            "--type",
            "rollback",
            "--field",
            "reason=bad export",
            "--field",
            "operator=alice",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("logs/governance.jsonl")).unwrap();
    let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(entry["details"]["reason"], "bad export");
    assert_eq!(entry["details"]["operator"], "alice");
}

#[test]
fn log_append_unknown_type_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["log", "append", "x", "--type", "celebration"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entry type"));
}

#[test]
fn log_append_without_init_fails() {
    let dir = TempDir::new().unwrap();
    wt(&dir)
        .args(["log", "append", "too early"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn log_list_filters_by_type() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["log", "append", "a decision", "--type", "decision"])
        .assert()
        .success();
    wt(&dir)
        .args(["log", "append", "a note"])
        .assert()
        .success();

    wt(&dir)
        .args(["log", "list", "--type", "decision"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a decision"))
        .stdout(predicate::str::contains("a note").not());
}

#[test]
fn log_tail_shows_recent_entries() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    for i in 0..5 {
        wt(&dir)
            .args(["log", "append", &format!("entry {i}")])
            .assert()
            .success();
    }

    wt(&dir)
        .args(["log", "tail", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entry 4"))
        .stdout(predicate::str::contains("entry 0").not());
}

#[test]
fn log_verify_passes_on_clean_log() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir).args(["log", "append", "fine"]).assert().success();
    wt(&dir)
        .args(["log", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 valid"));
}

#[test]
fn log_verify_fails_on_corrupt_line() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir).args(["log", "append", "fine"]).assert().success();
    use std::io::Write;
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("logs/governance.jsonl"))
        .unwrap();
    writeln!(f, "this is not json").unwrap();

    wt(&dir)
        .args(["log", "verify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid line"));
}

// ---------------------------------------------------------------------------
// wt migrate
// ---------------------------------------------------------------------------

fn write_projects_export(dir: &TempDir) -> String {
    let path = dir.path().join("projects.json");
    std::fs::write(
        &path,
        r#"{"data":[
            {"projectId":"WT-1","projectName":"Wombat Track","owner":"alice"},
            {"projectId":"WT-2","projectName":"Side Quest"}
        ]}"#,
    )
    .unwrap();
    path.display().to_string()
}

fn write_phases_export(dir: &TempDir, project_ref: &str) -> String {
    let path = dir.path().join("phases.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"data":[
                {{"phaseid":"WT-1.1","phasename":"Setup","WT Projects":"{project_ref}",
                  "notes":"1.1 Provision the staging database\n✅ Confirmed export integrity"}}
            ]}}"#
        ),
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn migrate_init_schema_creates_staging_db() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir).args(["migrate", "init-schema"]).assert().success();
    assert!(dir.path().join(".wt/staging.db").exists());
}

#[test]
fn migrate_backfill_and_validate_pass() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let projects = write_projects_export(&dir);
    let phases = write_phases_export(&dir, "WT-1");

    wt(&dir)
        .args(["migrate", "backfill-projects", &projects])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 succeeded"));
    wt(&dir)
        .args(["migrate", "backfill-phases", &phases])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded"));
    wt(&dir)
        .args(["migrate", "extract-steps", &phases])
        .assert()
        .success();
    wt(&dir)
        .args(["migrate", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: PASS"));
}

#[test]
fn migrate_validate_flags_orphans() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    // Phases referencing a project that was never backfilled.
    let phases = write_phases_export(&dir, "WT-MISSING");
    wt(&dir)
        .args(["migrate", "backfill-phases", &phases])
        .assert()
        .success();

    wt(&dir)
        .args(["migrate", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("orphaned phases: 1"));
}

#[test]
fn migrate_operations_append_governance_entries() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let projects = write_projects_export(&dir);
    wt(&dir)
        .args(["migrate", "backfill-projects", &projects])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("logs/governance.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 1);
    let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(entry["entryType"], "CanonicalMigration");
    assert_eq!(entry["resource"], "projects_canonical");
    assert_eq!(entry["recordCount"], 2);
    assert_eq!(entry["successCount"], 2);
}

#[test]
fn migrate_validate_writes_report_file() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let report = dir.path().join("validation_report.json");
    wt(&dir)
        .args(["migrate", "validate", "--report"])
        .arg(&report)
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(parsed["status"], "PASS");
}

#[test]
fn migrate_missing_export_file_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["migrate", "backfill-projects", "nope.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// wt config
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_project_name() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name:"));
}

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

// ---------------------------------------------------------------------------
// wt workspace
// ---------------------------------------------------------------------------

#[test]
fn workspace_without_base_url_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .env("WT_WORKSPACE_TOKEN", "t")
        .args(["workspace", "query", "db-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base URL not configured"));
}

#[test]
fn json_flag_emits_machine_output() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    wt(&dir)
        .args(["log", "append", "for the machines"])
        .assert()
        .success();

    let out = wt(&dir)
        .args(["--json", "log", "list"])
        .assert()
        .success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
}
