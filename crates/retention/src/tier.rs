//! Time-tier bucketing for retention decisions

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};
use std::fmt;

/// Retention granularity, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Tier {
    /// Claiming order: finer tiers claim snapshots before coarser ones.
    pub const ORDER: [Tier; 5] = [
        Tier::Hourly,
        Tier::Daily,
        Tier::Weekly,
        Tier::Monthly,
        Tier::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::Yearly => "yearly",
        }
    }

    /// Truncate `time` to the start of the period it falls in.
    ///
    /// Weeks are ISO weeks and start on Monday. The key stays in the
    /// offset the timestamp carries; keys compare by instant.
    pub fn bucket_key(self, time: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let key = match self {
            Tier::Hourly => truncate_to_hour(time),
            Tier::Daily => truncate_to_midnight(time),
            Tier::Weekly => {
                let days_into_week = i64::from(time.weekday().num_days_from_monday());
                truncate_to_midnight(time - Duration::days(days_into_week))
            }
            Tier::Monthly => truncate_to_midnight(time).and_then(|t| t.with_day(1)),
            Tier::Yearly => truncate_to_midnight(time)
                .and_then(|t| t.with_day(1))
                .and_then(|t| t.with_month(1)),
        };
        // Clamping components toward the epoch never fails for a
        // fixed-offset timestamp.
        key.unwrap_or(time)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn truncate_to_hour(time: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    time.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}

fn truncate_to_midnight(time: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    truncate_to_hour(time)?.with_hour(0)
}
