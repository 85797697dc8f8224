//! Verify repository integrity

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;

pub async fn run(repo: RepoArgs) -> Result<()> {
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository.clone(), creds.secret);

    println!("Checking repository {}", creds.repository.cyan());
    let spinner = util::spinner("Running integrity check...");
    let result = engine.check();
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            println!("{}", "Repository integrity check passed".green().bold());
            Ok(())
        }
        Err(e) => {
            println!("{}", "Repository integrity check failed".red().bold());
            Err(e).context("Repository check reported errors")
        }
    }
}
