//! Mount the repository as a browsable filesystem

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{platform, Engine, ResticEngine};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub async fn run(target: Option<PathBuf>, repo: RepoArgs) -> Result<()> {
    // 1. Resolve credentials and the mount point
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    let target = target
        .or_else(|| config.mount_path.clone())
        .map(|t| util::expand_home(&t))
        .unwrap_or_else(platform::default_mount_path);

    // 2. Make sure the mount point exists
    if !target.exists() {
        std::fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create mount point {}", target.display()))?;
    }

    // 3. Spawn restic mount and hold it until Ctrl-C
    let mut child = engine.mount(&target).context("Failed to mount repository")?;

    println!("Repository mounted at {}", target.display().to_string().cyan());
    println!("{}", "Press Ctrl-C to unmount".dimmed());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        // restic may exit on its own (unmounted externally, or failed).
        if let Some(status) = child.try_wait().context("Failed to poll restic mount")? {
            if status.success() {
                println!("Mount ended");
                return Ok(());
            }
            anyhow::bail!("restic mount exited with {}", status);
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                println!("Unmounting...");
                if let Err(e) = engine.unmount(&target) {
                    warn!("Clean unmount failed: {}", e);
                    let _ = child.kill();
                }
                child.wait().context("Failed waiting for restic mount to stop")?;
                println!("{}", "Unmounted".green());
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
        }
    }
}
