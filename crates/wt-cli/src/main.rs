mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, log::LogSubcommand, migrate::MigrateSubcommand,
    workspace::WorkspaceSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wt",
    about = "Wombat Track automation — governance log, canonical migration, and workspace sync",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .wt/ or .git/)
    #[arg(long, global = true, env = "WT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Wombat Track in the current project
    Init,

    /// Append to and read the governance log
    Log {
        #[command(subcommand)]
        subcommand: LogSubcommand,
    },

    /// Run the canonical migration pipeline against the staging database
    Migrate {
        #[command(subcommand)]
        subcommand: MigrateSubcommand,
    },

    /// Talk to the remote workspace API
    Workspace {
        #[command(subcommand)]
        subcommand: WorkspaceSubcommand,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // .env loading is a convenience for API tokens; a missing file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Log { subcommand } => cmd::log::run(&root, subcommand, cli.json),
        Commands::Migrate { subcommand } => cmd::migrate::run(&root, subcommand, cli.json),
        Commands::Workspace { subcommand } => cmd::workspace::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
