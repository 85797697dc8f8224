//! Apply the retention policy and prune unreferenced data

use crate::config::VaultConfig;
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;
use retention::{RetentionEvaluator, RetentionPolicy};
use std::path::PathBuf;

pub async fn run(policy_file: Option<PathBuf>, dry_run: bool, repo: RepoArgs) -> Result<()> {
    // 1. Resolve configuration and credentials
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    // 2. Load the retention policy
    let policy = util::load_policy(policy_file.as_deref(), &config);

    // 3. Evaluate and apply
    apply_retention(&engine, &policy, dry_run)
}

/// Shared retention pass: list, evaluate, forget, prune.
///
/// `backup` runs this after its snapshots; `prune` runs it standalone.
pub(crate) fn apply_retention(
    engine: &dyn Engine,
    policy: &RetentionPolicy,
    dry_run: bool,
) -> Result<()> {
    let spinner = util::spinner("Listing snapshots...");
    let snapshots = engine.snapshots().context("Failed to list snapshots")?;
    spinner.finish_and_clear();

    if snapshots.is_empty() {
        println!("{}", "No snapshots to evaluate".dimmed());
        return Ok(());
    }

    let evaluator = RetentionEvaluator::new(policy.clone());
    let evaluation = evaluator.evaluate(&snapshots);

    println!(
        "Retention: keeping {}, forgetting {} of {} snapshots",
        evaluation.keep.len().to_string().green(),
        evaluation.forget.len().to_string().yellow(),
        snapshots.len()
    );

    if evaluation.forget.is_empty() {
        println!("{}", "Nothing to forget - the repository already satisfies the policy".dimmed());
        return Ok(());
    }

    if dry_run {
        println!();
        println!("{}", "Would forget (dry run):".bold());
        for snap in snapshots.iter().filter(|s| !evaluation.keep.contains(&s.id)) {
            println!(
                "  {} {} [{}]",
                snap.short_id().yellow(),
                snap.time.format("%Y-%m-%d %H:%M:%S"),
                snap.tags.join(",")
            );
        }
        return Ok(());
    }

    let spinner = util::spinner("Forgetting snapshots...");
    let forgotten = engine.forget(&evaluation.forget);
    spinner.finish_and_clear();
    forgotten.context("Failed to forget snapshots")?;

    let spinner = util::spinner("Pruning unreferenced data...");
    let pruned = engine.prune();
    spinner.finish_and_clear();
    pruned.context("Failed to prune repository")?;

    println!("{}", "Prune complete".green().bold());
    Ok(())
}
