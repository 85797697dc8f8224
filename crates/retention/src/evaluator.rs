//! Retention evaluation over snapshot sets

use crate::policy::RetentionPolicy;
use crate::tier::Tier;
use ahash::AHashMap;
use chrono::{DateTime, FixedOffset};
use engine::Snapshot;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::info;

/// Outcome of a retention pass
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Snapshot ids elected for retention
    pub keep: HashSet<String>,
    /// Ids to forget, in the order the snapshots were supplied
    pub forget: Vec<String>,
}

/// Applies a [`RetentionPolicy`] to a snapshot list.
pub struct RetentionEvaluator {
    policy: RetentionPolicy,
}

impl RetentionEvaluator {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    /// Decide which snapshots survive under the policy.
    ///
    /// Tiers claim snapshots in fixed order, hourly first and yearly last;
    /// a snapshot claimed by one tier is invisible to the tiers after it.
    /// Within a tier each time bucket keeps its newest unclaimed snapshot,
    /// and the tier keeps at most its configured count of buckets, newest
    /// buckets first. Everything unclaimed at the end is forgotten.
    pub fn evaluate(&self, snapshots: &[Snapshot]) -> Evaluation {
        if snapshots.is_empty() {
            return Evaluation::default();
        }

        // Newest first; timestamp ties resolved by id so reruns agree.
        let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
        ordered.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id)));

        let mut keep: HashSet<String> = HashSet::new();
        for tier in Tier::ORDER {
            let limit = self.policy.count(tier);
            if limit == 0 {
                continue;
            }
            claim_tier(tier, limit, &ordered, &mut keep);
        }

        let forget: Vec<String> = snapshots
            .iter()
            .filter(|snap| !keep.contains(&snap.id))
            .map(|snap| snap.id.clone())
            .collect();

        info!(
            "Retention: keeping {} snapshots, forgetting {}",
            keep.len(),
            forget.len()
        );

        Evaluation { keep, forget }
    }
}

/// Claim up to `limit` snapshots for `tier`, one per time bucket, newest
/// buckets first. Snapshots already claimed never represent a bucket here.
fn claim_tier(tier: Tier, limit: u32, ordered: &[&Snapshot], keep: &mut HashSet<String>) {
    // `ordered` is newest first, so the first unclaimed snapshot seen for
    // a bucket is the one that represents it.
    let mut buckets: AHashMap<DateTime<FixedOffset>, &Snapshot> = AHashMap::new();
    for &snap in ordered {
        if keep.contains(&snap.id) {
            continue;
        }
        buckets.entry(tier.bucket_key(snap.time)).or_insert(snap);
    }

    let mut candidates: Vec<(DateTime<FixedOffset>, &Snapshot)> = buckets.into_iter().collect();
    candidates.sort_unstable_by_key(|(key, _)| Reverse(*key));

    for (_, snap) in candidates.into_iter().take(limit as usize) {
        keep.insert(snap.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snap(id: &str, time: DateTime<FixedOffset>) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            time,
            hostname: "test-host".to_string(),
            paths: vec!["/home/user".to_string()],
            tags: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-15T12:30:45+00:00").unwrap()
    }

    fn policy(hourly: u32, daily: u32, weekly: u32, monthly: u32, yearly: u32) -> RetentionPolicy {
        RetentionPolicy { hourly, daily, weekly, monthly, yearly, exclude_patterns: Vec::new() }
    }

    /// A fleet with enough history that every tier can fill its quota from
    /// distinct buckets.
    fn mixed_fleet() -> Vec<Snapshot> {
        let now = now();
        let mut snapshots = Vec::new();
        for i in 1..=48 {
            snapshots.push(snap(&format!("hourly-{}", i), now - Duration::hours(i)));
        }
        for i in 1..=14 {
            snapshots.push(snap(&format!("daily-{}", i), now - Duration::days(i)));
        }
        for i in 1..=8 {
            snapshots.push(snap(&format!("weekly-{}", i), now - Duration::weeks(i)));
        }
        for i in 1..=12 {
            snapshots.push(snap(&format!("monthly-{}", i), now - Duration::days(i * 30)));
        }
        for i in 1..=5 {
            snapshots.push(snap(&format!("yearly-{}", i), now - Duration::days(i * 365)));
        }
        snapshots
    }

    #[test]
    fn tiers_claim_disjoint_snapshots() {
        let snapshots = mixed_fleet();
        let evaluator = RetentionEvaluator::new(policy(24, 7, 4, 6, 3));
        let result = evaluator.evaluate(&snapshots);

        // Every tier fills its full quota, and no snapshot counts twice.
        assert_eq!(result.keep.len(), 24 + 7 + 4 + 6 + 3);
        assert_eq!(result.forget.len(), snapshots.len() - result.keep.len());
        for id in &result.forget {
            assert!(!result.keep.contains(id));
        }
    }

    #[test]
    fn empty_input_keeps_and_forgets_nothing() {
        let evaluator = RetentionEvaluator::new(RetentionPolicy::default());
        let result = evaluator.evaluate(&[]);
        assert!(result.keep.is_empty());
        assert!(result.forget.is_empty());
    }

    #[test]
    fn disabled_tier_is_skipped_not_blocking() {
        let now = now();
        let snapshots: Vec<Snapshot> =
            (0..5).map(|i| snap(&format!("day-{}", i), now - Duration::days(i))).collect();

        // Five snapshots on five distinct days, but the daily tier is off;
        // only the hourly tier claims anything.
        let result = RetentionEvaluator::new(policy(2, 0, 0, 0, 0)).evaluate(&snapshots);
        assert_eq!(result.keep.len(), 2);
        assert!(result.keep.contains("day-0"));
        assert!(result.keep.contains("day-1"));
        assert_eq!(result.forget.len(), 3);
    }

    #[test]
    fn all_zero_policy_forgets_everything() {
        let now = now();
        let snapshots: Vec<Snapshot> =
            (0..4).map(|i| snap(&format!("s{}", i), now - Duration::hours(i))).collect();
        let result = RetentionEvaluator::new(policy(0, 0, 0, 0, 0)).evaluate(&snapshots);
        assert!(result.keep.is_empty());
        assert_eq!(result.forget, vec!["s0", "s1", "s2", "s3"]);
    }

    #[test]
    fn same_hour_snapshots_share_one_hourly_slot() {
        let now = now();
        let snapshots = vec![snap("newer", now), snap("older", now - Duration::minutes(10))];

        // Plenty of hourly budget, but one bucket yields one keep.
        let result = RetentionEvaluator::new(policy(24, 0, 0, 0, 0)).evaluate(&snapshots);
        assert_eq!(result.keep.len(), 1);
        assert!(result.keep.contains("newer"));
        assert_eq!(result.forget, vec!["older".to_string()]);
    }

    #[test]
    fn later_tier_can_rescue_a_bucket_loser() {
        let now = now();
        let snapshots = vec![snap("newer", now), snap("older", now - Duration::minutes(10))];

        // Hourly claims "newer"; the daily bucket then falls to "older".
        let result = RetentionEvaluator::new(policy(1, 1, 0, 0, 0)).evaluate(&snapshots);
        assert!(result.keep.contains("newer"));
        assert!(result.keep.contains("older"));
        assert!(result.forget.is_empty());
    }

    #[test]
    fn newest_buckets_win_when_over_budget() {
        let now = now();
        let snapshots: Vec<Snapshot> =
            (0..6).map(|i| snap(&format!("h{}", i), now - Duration::hours(i))).collect();
        let result = RetentionEvaluator::new(policy(3, 0, 0, 0, 0)).evaluate(&snapshots);
        assert!(result.keep.contains("h0"));
        assert!(result.keep.contains("h1"));
        assert!(result.keep.contains("h2"));
        assert_eq!(result.forget, vec!["h3", "h4", "h5"]);
    }

    #[test]
    fn equal_timestamps_resolve_by_id() {
        let now = now();
        let snapshots = vec![snap("bbb", now), snap("aaa", now)];
        let result = RetentionEvaluator::new(policy(1, 0, 0, 0, 0)).evaluate(&snapshots);
        assert!(result.keep.contains("aaa"));
        assert_eq!(result.forget, vec!["bbb".to_string()]);
    }

    #[test]
    fn forget_preserves_input_order() {
        let now = now();
        let snapshots = vec![
            snap("old-2", now - Duration::hours(3)),
            snap("old-1", now - Duration::hours(2)),
            snap("keep", now),
        ];
        let result = RetentionEvaluator::new(policy(1, 0, 0, 0, 0)).evaluate(&snapshots);
        assert!(result.keep.contains("keep"));
        assert_eq!(result.forget, vec!["old-2".to_string(), "old-1".to_string()]);
    }
}
