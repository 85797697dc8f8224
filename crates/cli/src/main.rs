//! TimeVault CLI - backup orchestration around restic

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod config;
mod credentials;
mod util;

use credentials::RepoArgs;

/// TimeVault - personal backups with tiered retention
#[derive(Parser)]
#[command(name = "tv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new backup repository
    Init {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Snapshot paths and apply the retention policy
    Backup {
        /// Paths to back up (default: configured paths, else the home scheme)
        paths: Vec<PathBuf>,

        /// Retention policy file (YAML)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Tag to apply to the snapshots (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Skip the retention pass after the backup
        #[arg(long)]
        no_prune: bool,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// List snapshots
    Snapshots {
        /// Print the raw snapshot list as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Restore a path from a snapshot
    Restore {
        /// Snapshot id (as shown by `tv snapshots`)
        snapshot: String,

        /// Path inside the snapshot to restore
        path: String,

        /// Directory to restore into (default: current directory)
        #[arg(short, long)]
        target: Option<PathBuf>,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Apply the retention policy and drop unreferenced data
    Prune {
        /// Retention policy file (YAML)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Show what would be forgotten without changing anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Verify repository integrity
    Check {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Mount the repository as a browsable filesystem
    Mount {
        /// Mount point (default: the platform mount path)
        #[arg(short, long)]
        target: Option<PathBuf>,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Reinstall software from the newest manifest snapshot
    Replay {
        #[command(flatten)]
        repo: RepoArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Init { repo } => cmd::init::run(repo).await,
        Commands::Backup { paths, policy, tags, no_prune, repo } => {
            cmd::backup::run(paths, policy, tags, no_prune, cli.verbose, repo).await
        }
        Commands::Snapshots { json, repo } => cmd::snapshots::run(json, repo).await,
        Commands::Restore { snapshot, path, target, repo } => {
            cmd::restore::run(snapshot, path, target, repo).await
        }
        Commands::Prune { policy, dry_run, repo } => cmd::prune::run(policy, dry_run, repo).await,
        Commands::Check { repo } => cmd::check::run(repo).await,
        Commands::Mount { target, repo } => cmd::mount::run(target, repo).await,
        Commands::Replay { repo } => cmd::replay::run(repo).await,
    }
}

fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
