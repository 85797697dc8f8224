//! Reinstall software from the newest manifest snapshot

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::ResticEngine;
use manifest::{
    find_latest_manifest_snapshot, replay_brewfile, replay_mas_manifest, restore_manifests,
};
use owo_colors::OwoColorize;

pub async fn run(repo: RepoArgs) -> Result<()> {
    // 1. Resolve credentials
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    // 2. Locate the newest manifest snapshot
    let spinner = util::spinner("Looking for a manifest snapshot...");
    let snapshot = find_latest_manifest_snapshot(&engine)?;
    spinner.finish_and_clear();

    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => anyhow::bail!("No manifest snapshot found; nothing to replay"),
    };
    println!(
        "Using manifest snapshot {} from {}",
        snapshot.short_id().yellow(),
        snapshot.time.format("%Y-%m-%d %H:%M:%S")
    );

    // 3. Restore the manifest files somewhere temporary
    let temp_dir = tempfile::Builder::new()
        .prefix("timevault-replay-")
        .tempdir()
        .context("Failed to create a temporary directory")?;
    let restored = restore_manifests(&engine, &snapshot.id, temp_dir.path())?;
    if restored.is_empty() {
        anyhow::bail!("No manifest files could be restored from snapshot {}", snapshot.id);
    }

    // 4. Replay what came back
    if let Some(brewfile) = restored.get("Brewfile") {
        println!();
        println!("{}", "Replaying Brewfile".bold());
        if let Err(e) = replay_brewfile(brewfile) {
            eprintln!("  {} {}", "Homebrew replay failed:".red(), e);
        }
    } else {
        println!("{}", "No Brewfile in the snapshot; skipping Homebrew".dimmed());
    }

    if let Some(mas_manifest) = restored.get("mas.txt") {
        println!();
        println!("{}", "Replaying Mac App Store manifest".bold());
        match replay_mas_manifest(mas_manifest) {
            Ok(report) if report.failed == 0 => {
                println!("  {} app(s) installed", report.installed);
            }
            Ok(report) => {
                println!(
                    "  {} app(s) installed, {} failed",
                    report.installed,
                    report.failed.to_string().yellow()
                );
            }
            Err(e) => eprintln!("  {} {}", "App Store replay failed:".red(), e),
        }
    } else {
        println!("{}", "No mas.txt in the snapshot; skipping the App Store".dimmed());
    }

    if let Some(apps) = restored.get("applications.json") {
        println!();
        println!("{}", "Manual follow-up".yellow().bold());
        println!("A list of installed GUI applications was restored to:");
        println!("  {}", apps.display().to_string().cyan());
        println!("Review it for anything Homebrew and the App Store did not cover.");
    }

    println!();
    println!("{}", "Manifest replay complete".green().bold());
    Ok(())
}
