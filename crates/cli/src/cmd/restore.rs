//! Restore a path from a snapshot

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub async fn run(
    snapshot: String,
    path: String,
    target: Option<PathBuf>,
    repo: RepoArgs,
) -> Result<()> {
    // 1. Resolve credentials and build the engine
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    // 2. Work out where to put it
    let target = match target {
        Some(target) => util::expand_home(&target),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    println!(
        "Restoring {} from snapshot {} into {}",
        path.cyan(),
        snapshot.yellow(),
        target.display()
    );

    // 3. Run the restore
    let spinner = util::spinner("Restoring...");
    let result = engine.restore(&snapshot, &[path.clone()], &target);
    spinner.finish_and_clear();
    result.with_context(|| format!("Failed to restore {} from snapshot {}", path, snapshot))?;

    println!("{}", "Restore complete".green().bold());
    Ok(())
}
