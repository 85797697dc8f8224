//! User configuration file
//!
//! Lives at `~/.config/timevault/config.yaml` (or under
//! `$XDG_CONFIG_HOME`); every key is optional:
//!
//! ```yaml
//! repo: sftp:backup@nas:/srv/restic
//! mount_path: ~/mnt/timevault
//! exclude_patterns:
//!   - "*.cache"
//! backup_paths:
//!   - path: ~/work
//!     tag: work
//!     exclude: ["target/"]
//! retention:
//!   daily: 30
//! ```
//!
//! A missing file is an empty config, and a malformed file behaves like a
//! missing one after logging the parse error. Invalid `backup_paths`
//! entries are skipped one by one so a single typo does not drop the rest.

use crate::util;
use retention::RetentionPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// One backup source from the config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BackupPath {
    pub path: PathBuf,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Per-tier keep-count overrides; unset tiers keep the policy default.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct RetentionOverrides {
    pub hourly: Option<u32>,
    pub daily: Option<u32>,
    pub weekly: Option<u32>,
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
}

impl RetentionOverrides {
    pub fn apply_to(&self, mut policy: RetentionPolicy) -> RetentionPolicy {
        if let Some(hourly) = self.hourly {
            policy.hourly = hourly;
        }
        if let Some(daily) = self.daily {
            policy.daily = daily;
        }
        if let Some(weekly) = self.weekly {
            policy.weekly = weekly;
        }
        if let Some(monthly) = self.monthly {
            policy.monthly = monthly;
        }
        if let Some(yearly) = self.yearly {
            policy.yearly = yearly;
        }
        policy
    }
}

/// Settings loaded from the config file.
#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
    pub repo: Option<String>,
    pub mount_path: Option<PathBuf>,
    pub backup_paths: Vec<BackupPath>,
    pub exclude_patterns: Vec<String>,
    pub retention: RetentionOverrides,
}

/// On-disk shape; `backup_paths` entries are validated one by one.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    repo: Option<String>,
    mount_path: Option<PathBuf>,
    #[serde(default)]
    backup_paths: Vec<serde_yaml::Value>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
    #[serde(default)]
    retention: RetentionOverrides,
}

impl VaultConfig {
    /// Load the user configuration, or defaults when absent.
    pub fn load() -> Self {
        let path = default_config_path();
        if !path.exists() {
            return Self::default();
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml_str(&contents),
            Err(e) => {
                error!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_yaml_str(contents: &str) -> Self {
        match serde_yaml::from_str::<RawConfig>(contents) {
            Ok(raw) => Self::from_raw(raw),
            Err(e) => {
                error!("Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut backup_paths = Vec::new();
        for entry in raw.backup_paths {
            match serde_yaml::from_value::<BackupPath>(entry) {
                Ok(parsed) => backup_paths.push(BackupPath {
                    path: util::expand_home(&parsed.path),
                    tag: parsed.tag,
                    exclude: parsed.exclude.iter().map(|p| expand_pattern(p)).collect(),
                }),
                Err(e) => warn!("Skipping invalid backup_paths entry: {}", e),
            }
        }

        Self {
            repo: raw.repo,
            mount_path: raw.mount_path.map(|p| util::expand_home(&p)),
            backup_paths,
            exclude_patterns: raw.exclude_patterns.iter().map(|p| expand_pattern(p)).collect(),
            retention: raw.retention,
        }
    }
}

/// Expand `~` in a pattern that names a concrete path; globs like `*.log`
/// pass through untouched.
fn expand_pattern(pattern: &str) -> String {
    if pattern == "~" || pattern.starts_with("~/") {
        util::expand_home(Path::new(pattern)).display().to_string()
    } else {
        pattern.to_string()
    }
}

/// Default config location, honoring `$XDG_CONFIG_HOME`.
pub fn default_config_path() -> PathBuf {
    let xdg = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| !p.as_os_str().is_empty());
    config_path_from(xdg, dirs::home_dir())
}

fn config_path_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg
        .or_else(|| home.map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("timevault").join("config.yaml")
}
