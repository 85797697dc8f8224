//! Shared utilities for CLI commands

use crate::config::VaultConfig;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use retention::RetentionPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Print a section header.
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
}

/// Spinner shown around blocking engine calls.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Retention policy for this run: an explicit file wins; otherwise the
/// config file's overrides and excludes are applied on top of the defaults.
pub fn load_policy(policy_file: Option<&Path>, config: &VaultConfig) -> RetentionPolicy {
    if let Some(path) = policy_file {
        info!("Loading retention policy from {}", path.display());
        return RetentionPolicy::from_file(path);
    }
    let mut policy = config.retention.apply_to(RetentionPolicy::default());
    policy.exclude_patterns.extend(config.exclude_patterns.iter().cloned());
    policy
}

/// Expand a leading `~` against the current home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    expand_home_in(path, dirs::home_dir().as_deref())
}

fn expand_home_in(path: &Path, home: Option<&Path>) -> PathBuf {
    let home = match home {
        Some(home) => home,
        None => return path.to_path_buf(),
    };

    if path == Path::new("~") {
        return home.to_path_buf();
    }
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionOverrides;

    #[test]
    fn expand_home_rewrites_tilde_prefix() {
        let home = Path::new("/home/tester");
        assert_eq!(
            expand_home_in(Path::new("~/docs"), Some(home)),
            PathBuf::from("/home/tester/docs")
        );
        assert_eq!(expand_home_in(Path::new("~"), Some(home)), PathBuf::from("/home/tester"));
        assert_eq!(
            expand_home_in(Path::new("/abs/path"), Some(home)),
            PathBuf::from("/abs/path")
        );
        // `~user` forms are left alone.
        assert_eq!(
            expand_home_in(Path::new("~other/docs"), Some(home)),
            PathBuf::from("~other/docs")
        );
        assert_eq!(expand_home_in(Path::new("~/docs"), None), PathBuf::from("~/docs"));
    }

    #[test]
    fn policy_overrides_come_from_config() {
        let config = VaultConfig {
            retention: RetentionOverrides {
                daily: Some(30),
                yearly: Some(10),
                ..Default::default()
            },
            exclude_patterns: vec!["*.cache".to_string()],
            ..Default::default()
        };
        let policy = load_policy(None, &config);
        assert_eq!(policy.daily, 30);
        assert_eq!(policy.yearly, 10);
        // untouched tiers keep their defaults
        assert_eq!(policy.hourly, 24);
        assert_eq!(policy.exclude_patterns, vec!["*.cache".to_string()]);
    }

    #[test]
    fn explicit_policy_file_wins_over_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "daily: 2\n").unwrap();

        let config = VaultConfig {
            retention: RetentionOverrides { daily: Some(30), ..Default::default() },
            ..Default::default()
        };
        let policy = load_policy(Some(&path), &config);
        assert_eq!(policy.daily, 2);
    }
}
