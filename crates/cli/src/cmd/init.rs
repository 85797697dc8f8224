//! Initialize a new backup repository

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;

pub async fn run(repo: RepoArgs) -> Result<()> {
    // 1. Resolve credentials and build the engine
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository.clone(), creds.secret);

    // 2. Refuse to reinitialize
    if engine.repository_exists() {
        anyhow::bail!("Repository already exists at {}", creds.repository);
    }

    // 3. Create it
    println!("Initializing repository at {}", creds.repository.cyan());
    engine.init().context("Failed to initialize repository")?;

    println!("{}", "Repository initialized".green().bold());
    println!();
    println!("Next steps:");
    println!("  - Run 'tv backup' to create a first snapshot");
    println!("  - Run 'tv snapshots' to see what is stored");
    Ok(())
}
