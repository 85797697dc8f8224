//! Locate, restore, and replay software manifests

use anyhow::{Context, Result};
use engine::{Engine, Snapshot};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};

/// Tag that marks a snapshot as carrying manifest files.
pub const MANIFEST_TAG: &str = "manifest";

/// Manifest files a snapshot may carry.
pub const MANIFEST_FILES: [&str; 3] = ["Brewfile", "applications.json", "mas.txt"];

/// Newest snapshot tagged as a manifest carrier, if any.
pub fn find_latest_manifest_snapshot(engine: &dyn Engine) -> Result<Option<Snapshot>> {
    let mut snapshots = engine.snapshots().context("Failed to list snapshots")?;
    snapshots.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id)));

    let found = snapshots
        .into_iter()
        .find(|snapshot| snapshot.tags.iter().any(|tag| tag == MANIFEST_TAG));
    match &found {
        Some(snapshot) => info!("Found manifest snapshot {} from {}", snapshot.id, snapshot.time),
        None => warn!("No manifest snapshot found"),
    }
    Ok(found)
}

/// Restore the known manifest files from a snapshot into `target_dir`.
///
/// Returns the files that actually materialized, keyed by manifest name.
/// Files the snapshot does not carry are skipped with a warning.
pub fn restore_manifests(
    engine: &dyn Engine,
    snapshot_id: &str,
    target_dir: &Path,
) -> Result<HashMap<String, PathBuf>> {
    let names: Vec<String> = MANIFEST_FILES.iter().map(|name| name.to_string()).collect();
    engine
        .restore(snapshot_id, &names, target_dir)
        .with_context(|| format!("Failed to restore manifests from snapshot {}", snapshot_id))?;

    let mut restored = HashMap::new();
    for name in MANIFEST_FILES {
        let path = target_dir.join(name);
        if path.is_file() {
            debug!("Restored {} to {}", name, path.display());
            restored.insert(name.to_string(), path);
        } else {
            warn!("Snapshot {} does not carry {}", snapshot_id, name);
        }
    }
    Ok(restored)
}

/// One `<app id> <app name>` line from `mas.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasEntry {
    pub id: String,
    pub name: String,
}

/// Result of replaying a Mac App Store manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasReplay {
    pub installed: usize,
    pub failed: usize,
}

/// Parse `mas.txt` content: one app per line, numeric id first, the rest
/// of the line is the display name. Lines without a leading id are skipped.
pub fn parse_mas_manifest(contents: &str) -> Vec<MasEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let id = parts.next()?;
            if !id.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(MasEntry {
                id: id.to_string(),
                name: parts.collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}

/// Reinstall Homebrew packages from a Brewfile, streaming brew's output.
pub fn replay_brewfile(brewfile: &Path) -> Result<()> {
    anyhow::ensure!(brewfile.is_file(), "Brewfile not found at {}", brewfile.display());

    info!("Replaying Brewfile from {}", brewfile.display());
    let status = Command::new("brew")
        .args(["bundle", "install"])
        .arg(format!("--file={}", brewfile.display()))
        .status()
        .context("Failed to run brew (is Homebrew installed?)")?;

    anyhow::ensure!(status.success(), "brew bundle install exited with {}", status);
    info!("Brewfile replay completed");
    Ok(())
}

/// Reinstall Mac App Store apps listed in a `mas.txt` manifest.
///
/// Individual install failures are counted, not fatal; only a missing
/// `mas` binary aborts the replay.
pub fn replay_mas_manifest(manifest: &Path) -> Result<MasReplay> {
    let contents = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let entries = parse_mas_manifest(&contents);

    let mut failed = 0;
    for entry in &entries {
        info!("Installing {} ({}) from the Mac App Store", entry.name, entry.id);
        let output = Command::new("mas")
            .args(["install", &entry.id])
            .output()
            .context("Failed to run mas (is it installed?)")?;
        if !output.status.success() {
            error!(
                "Failed to install {} ({}): {}",
                entry.name,
                entry.id,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            failed += 1;
        }
    }

    if failed > 0 {
        warn!("App Store replay completed with {} failure(s)", failed);
    } else {
        info!("App Store replay completed");
    }
    Ok(MasReplay { installed: entries.len() - failed, failed })
}
