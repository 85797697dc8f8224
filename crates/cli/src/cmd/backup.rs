//! Snapshot paths into the repository, then apply the retention policy

use crate::config::{BackupPath, VaultConfig};
use crate::credentials::{self, RepoArgs};
use crate::util;
use anyhow::{Context, Result};
use engine::{Engine, ResticEngine};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// One restic invocation's worth of work.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BackupJob {
    label: String,
    paths: Vec<PathBuf>,
    exclude: Vec<String>,
    tags: Vec<String>,
}

pub async fn run(
    paths: Vec<PathBuf>,
    policy_file: Option<PathBuf>,
    tags: Vec<String>,
    no_prune: bool,
    verbose: bool,
    repo: RepoArgs,
) -> Result<()> {
    // 1. Resolve configuration and credentials
    let config = VaultConfig::load();
    let creds = credentials::resolve(&repo, &config)?;
    let engine = ResticEngine::new(creds.repository, creds.secret);

    // 2. Load the retention policy (its excludes apply to every job)
    let policy = util::load_policy(policy_file.as_deref(), &config);

    // 3. Decide what to back up
    let jobs = if !paths.is_empty() {
        let expanded: Vec<PathBuf> = paths.iter().map(|p| util::expand_home(p)).collect();
        let label = expanded
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        vec![BackupJob {
            label,
            paths: expanded,
            exclude: policy.exclude_patterns.clone(),
            tags: tags.clone(),
        }]
    } else if !config.backup_paths.is_empty() {
        configured_jobs(&config.backup_paths, &policy.exclude_patterns, &tags)
    } else {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        default_jobs(&home, &policy.exclude_patterns, &tags)
    };

    // 4. Run each job, tolerating individual failures
    util::print_header("Running backup");
    let mut failures = 0usize;
    for job in &jobs {
        println!("Backing up {}", job.label.cyan());
        let spinner = (!verbose).then(|| util::spinner("restic backup..."));
        let outcome = engine.backup(&job.paths, &job.exclude, &job.tags, verbose);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        match outcome {
            Ok(Some(id)) => println!("  snapshot {}", id.yellow()),
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                eprintln!("  {} {}", "backup failed:".red(), e);
            }
        }
    }
    println!();

    if failures > 0 {
        if failures == jobs.len() {
            anyhow::bail!("All {} backup job(s) failed", failures);
        }
        println!("{}", format!("{} of {} jobs failed", failures, jobs.len()).yellow());
    }

    // 5. Retention pass unless asked not to
    if no_prune {
        println!("{}", "Skipping retention (--no-prune)".dimmed());
    } else {
        crate::cmd::prune::apply_retention(&engine, &policy, false)?;
    }

    println!("{}", "Backup complete".green().bold());
    Ok(())
}

/// Jobs from the config file's `backup_paths` entries.
fn configured_jobs(
    entries: &[BackupPath],
    base_exclude: &[String],
    base_tags: &[String],
) -> Vec<BackupJob> {
    entries
        .iter()
        .map(|entry| {
            let mut exclude = base_exclude.to_vec();
            exclude.extend(entry.exclude.iter().cloned());
            let mut tags = base_tags.to_vec();
            if let Some(tag) = &entry.tag {
                tags.push(tag.clone());
            }
            BackupJob {
                label: entry.path.display().to_string(),
                paths: vec![entry.path.clone()],
                exclude,
                tags,
            }
        })
        .collect()
}

/// The no-arguments scheme: the home directory, with `Library` and any
/// cloud-synced trees split into their own tagged snapshots so they can
/// follow different retention and restore paths.
fn default_jobs(home: &Path, base_exclude: &[String], base_tags: &[String]) -> Vec<BackupJob> {
    let library = home.join("Library");
    let cloud_storage = library.join("CloudStorage");

    let with_tag = |tag: &str| {
        let mut tags = base_tags.to_vec();
        tags.push(tag.to_string());
        tags
    };

    let mut jobs = Vec::new();

    // Home first, minus the trees that get their own snapshots.
    let mut home_exclude = base_exclude.to_vec();
    home_exclude.push(library.display().to_string());
    if cloud_storage.is_dir() {
        home_exclude.push(cloud_storage.display().to_string());
    }
    jobs.push(BackupJob {
        label: home.display().to_string(),
        paths: vec![home.to_path_buf()],
        exclude: home_exclude,
        tags: with_tag("home"),
    });

    if library.is_dir() {
        let mut exclude = base_exclude.to_vec();
        if cloud_storage.is_dir() {
            exclude.push(cloud_storage.display().to_string());
        }
        jobs.push(BackupJob {
            label: library.display().to_string(),
            paths: vec![library.clone()],
            exclude,
            tags: with_tag("library"),
        });
    }

    if cloud_storage.is_dir() {
        let mut providers: Vec<PathBuf> = std::fs::read_dir(&cloud_storage)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_dir())
                    .collect()
            })
            .unwrap_or_default();
        providers.sort();

        for provider in providers {
            let name = provider
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "cloud".to_string());
            jobs.push(BackupJob {
                label: provider.display().to_string(),
                paths: vec![provider.clone()],
                exclude: base_exclude.to_vec(),
                tags: with_tag(&format!("cloud-{}", name)),
            });
        }
    }

    jobs
}
