use anyhow::Context;
use std::path::Path;
use wt_core::{config::Config, io, paths};

/// Scaffold `.wt/` and `logs/` in the project root. Idempotent.
pub fn run(root: &Path) -> anyhow::Result<()> {
    io::ensure_dir(&paths::wt_dir(root))?;
    io::ensure_dir(&paths::logs_dir(root))?;

    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("Already initialized ({}).", config_path.display());
    } else {
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "wombat-track".to_string());
        Config::new(name)
            .save(root)
            .context("failed to write config")?;
        println!("Created {}.", config_path.display());
    }

    // The staging database is derived state, not something to commit.
    io::ensure_gitignore_entry(root, paths::STAGING_DB)?;

    println!("Governance log will be written to {}.", paths::GOVERNANCE_LOG);
    Ok(())
}
