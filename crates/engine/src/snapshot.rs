//! Snapshot records as reported by the backup tool

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One snapshot from `restic snapshots --json`.
///
/// `time` keeps whatever UTC offset restic reported; values still compare
/// by instant. Fields this tool does not model are carried in `metadata`
/// untouched so round-tripping a snapshot never loses anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub time: DateTime<FixedOffset>,
    pub hostname: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Snapshot {
    /// Abbreviated id for table output.
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(8);
        &self.id[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESTIC_SNAPSHOTS_JSON: &str = r#"[
      {
        "time": "2024-06-15T11:30:00.123456789+02:00",
        "parent": "2cf25cfa6941a6a3b4b4a83be4a26cbd1a1a2b1d0d8b0dd7a3bb3a1b2c3d4e5f",
        "tree": "9f3c1e7a2b4d5e6f9f3c1e7a2b4d5e6f9f3c1e7a2b4d5e6f9f3c1e7a2b4d5e6f",
        "paths": ["/home/user"],
        "hostname": "mbp",
        "username": "user",
        "id": "a1b2c3d4e5f60718a1b2c3d4e5f60718a1b2c3d4e5f60718a1b2c3d4e5f60718"
      },
      {
        "time": "2024-06-14T03:00:00Z",
        "paths": ["/etc"],
        "hostname": "server",
        "tags": ["nightly", "etc"],
        "id": "ffff0000ffff0000ffff0000ffff0000ffff0000ffff0000ffff0000ffff0000"
      }
    ]"#;

    #[test]
    fn parses_restic_snapshot_list() {
        let snaps: Vec<Snapshot> = serde_json::from_str(RESTIC_SNAPSHOTS_JSON).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].hostname, "mbp");
        // restic omits "tags" entirely when a snapshot has none
        assert!(snaps[0].tags.is_empty());
        assert_eq!(snaps[1].tags, vec!["nightly".to_string(), "etc".to_string()]);
    }

    #[test]
    fn unmodeled_fields_land_in_metadata() {
        let snaps: Vec<Snapshot> = serde_json::from_str(RESTIC_SNAPSHOTS_JSON).unwrap();
        assert_eq!(
            snaps[0].metadata.get("username").and_then(|v| v.as_str()),
            Some("user")
        );
        assert!(snaps[0].metadata.contains_key("tree"));
        assert!(snaps[1].metadata.is_empty());
    }

    #[test]
    fn time_offset_is_preserved() {
        let snaps: Vec<Snapshot> = serde_json::from_str(RESTIC_SNAPSHOTS_JSON).unwrap();
        assert_eq!(snaps[0].time.offset().local_minus_utc(), 2 * 3600);
        assert!(snaps[0].time > snaps[1].time);
    }

    #[test]
    fn short_id_truncates_long_ids() {
        let snaps: Vec<Snapshot> = serde_json::from_str(RESTIC_SNAPSHOTS_JSON).unwrap();
        assert_eq!(snaps[0].short_id(), "a1b2c3d4");

        let mut short = snaps[0].clone();
        short.id = "abc".to_string();
        assert_eq!(short.short_id(), "abc");
    }
}
