//! Retention policies and snapshot pruning decisions
//!
//! This crate decides which snapshots survive a pruning pass:
//! - `RetentionPolicy`: per-tier keep counts, loaded from YAML
//! - `Tier`: hourly/daily/weekly/monthly/yearly time bucketing
//! - `RetentionEvaluator`: the keep/forget decision itself

pub mod evaluator;
pub mod policy;
pub mod tier;

// Re-exports
pub use evaluator::{Evaluation, RetentionEvaluator};
pub use policy::{PolicyDocument, PolicyError, RetentionPolicy};
pub use tier::Tier;
