use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;
use wt_core::config::{Config, WarnLevel};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the resolved configuration
    Show,
    /// Check the configuration for problems
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                print_json(&cfg)?;
            } else {
                print!("{}", serde_yaml::to_string(&cfg)?);
            }
            Ok(())
        }
        ConfigSubcommand::Validate => {
            let warnings = cfg.validate();
            if json {
                print_json(&warnings)?;
            } else if warnings.is_empty() {
                println!("Configuration OK.");
            } else {
                for w in &warnings {
                    let level = match w.level {
                        WarnLevel::Warning => "warning",
                        WarnLevel::Error => "error",
                    };
                    println!("{level}: {}", w.message);
                }
            }
            if warnings.iter().any(|w| w.level == WarnLevel::Error) {
                anyhow::bail!("configuration has errors");
            }
            Ok(())
        }
    }
}
