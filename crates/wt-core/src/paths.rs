use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WT_DIR: &str = ".wt";
pub const LOGS_DIR: &str = "logs";

pub const CONFIG_FILE: &str = ".wt/config.yaml";
pub const GOVERNANCE_LOG: &str = "logs/governance.jsonl";
pub const STAGING_DB: &str = ".wt/staging.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn wt_dir(root: &Path) -> PathBuf {
    root.join(WT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}

pub fn governance_log_path(root: &Path) -> PathBuf {
    root.join(GOVERNANCE_LOG)
}

pub fn staging_db_path(root: &Path) -> PathBuf {
    root.join(STAGING_DB)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
