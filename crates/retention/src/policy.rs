//! Retention policy configuration
//!
//! Policies arrive as flat YAML mappings (`hourly: 24`, ...). Loading from
//! a file or string never fails: malformed input degrades to the defaults
//! so a scheduled backup is never blocked by a bad policy file. The typed
//! constructor rejects out-of-range counts instead.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// How many snapshots each tier retains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub hourly: u32,
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
    /// Glob patterns excluded from backup runs; evaluation ignores them.
    pub exclude_patterns: Vec<String>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            hourly: 24,
            daily: 7,
            weekly: 4,
            monthly: 12,
            yearly: 3,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Raw policy mapping as it appears on disk. Every key is optional;
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
}

/// Reasons a policy document is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{tier} count must not be negative (got {value})")]
    NegativeCount { tier: Tier, value: i64 },

    #[error("{tier} count {value} is out of range")]
    CountOutOfRange { tier: Tier, value: i64 },
}

impl RetentionPolicy {
    /// Build a policy from a parsed document, filling absent tiers with
    /// the defaults.
    pub fn from_document(doc: &PolicyDocument) -> Result<Self, PolicyError> {
        let defaults = Self::default();
        Ok(Self {
            hourly: tier_count(Tier::Hourly, doc.hourly, defaults.hourly)?,
            daily: tier_count(Tier::Daily, doc.daily, defaults.daily)?,
            weekly: tier_count(Tier::Weekly, doc.weekly, defaults.weekly)?,
            monthly: tier_count(Tier::Monthly, doc.monthly, defaults.monthly)?,
            yearly: tier_count(Tier::Yearly, doc.yearly, defaults.yearly)?,
            exclude_patterns: doc.exclude_patterns.clone().unwrap_or_default(),
        })
    }

    /// Parse a YAML policy. Any failure logs a warning and yields the
    /// defaults.
    pub fn from_yaml_str(yaml: &str) -> Self {
        let doc = match serde_yaml::from_str::<PolicyDocument>(yaml) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Unparseable retention policy, using defaults: {}", e);
                return Self::default();
            }
        };
        match Self::from_document(&doc) {
            Ok(policy) => policy,
            Err(e) => {
                warn!("Invalid retention policy, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load a YAML policy file. A missing or unreadable file yields the
    /// defaults.
    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml_str(&contents),
            Err(e) => {
                warn!("Could not read retention policy {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            hourly: Some(i64::from(self.hourly)),
            daily: Some(i64::from(self.daily)),
            weekly: Some(i64::from(self.weekly)),
            monthly: Some(i64::from(self.monthly)),
            yearly: Some(i64::from(self.yearly)),
            exclude_patterns: Some(self.exclude_patterns.clone()),
        }
    }

    /// Serialize as the flat YAML mapping `from_yaml_str` accepts.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_document())
    }

    /// Keep limit for one tier.
    pub fn count(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Hourly => self.hourly,
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            Tier::Yearly => self.yearly,
        }
    }
}

fn tier_count(tier: Tier, value: Option<i64>, default: u32) -> Result<u32, PolicyError> {
    let value = match value {
        Some(value) => value,
        None => return Ok(default),
    };
    if value < 0 {
        return Err(PolicyError::NegativeCount { tier, value });
    }
    u32::try_from(value).map_err(|_| PolicyError::CountOutOfRange { tier, value })
}
