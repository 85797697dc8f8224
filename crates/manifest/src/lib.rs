//! Software manifest replay
//!
//! Backups tagged `manifest` carry the files needed to rebuild an
//! installed software set (`Brewfile`, `applications.json`, `mas.txt`).
//! This crate finds the newest such snapshot, restores those files, and
//! replays them through `brew` and `mas`.

pub mod replay;

pub use replay::{
    find_latest_manifest_snapshot, parse_mas_manifest, replay_brewfile, replay_mas_manifest,
    restore_manifests, MasEntry, MasReplay, MANIFEST_FILES, MANIFEST_TAG,
};
