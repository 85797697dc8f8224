//! List snapshots in the repository

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;

pub async fn run(json: bool, repo: RepoArgs) -> Result<()> {
    // 1. Resolve credentials and build the engine
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    // 2. Fetch the snapshot list
    let spinner = util::spinner("Listing snapshots...");
    let mut snapshots = engine.snapshots().context("Failed to list snapshots")?;
    spinner.finish_and_clear();

    if snapshots.is_empty() {
        println!("{}", "No snapshots yet".dimmed());
        return Ok(());
    }

    snapshots.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id)));

    // 3. Emit JSON or the table
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    util::print_header("Snapshots");
    println!("{:<10} {:<21} {:<14} {:<24} PATHS", "ID", "TIME", "HOST", "TAGS");
    for snap in &snapshots {
        println!(
            "{} {:<21} {:<14} {} {}",
            format!("{:<10}", snap.short_id()).yellow(),
            snap.time.format("%Y-%m-%d %H:%M:%S"),
            snap.hostname,
            format!("{:<24}", snap.tags.join(",")).cyan(),
            snap.paths.join(", ")
        );
    }
    println!();
    println!("{} snapshot(s)", snapshots.len());
    Ok(())
}
