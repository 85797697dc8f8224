//! CLI command implementations

pub mod init;
pub mod backup;
pub mod snapshots;
pub mod restore;
pub mod prune;
pub mod check;
pub mod mount;
pub mod replay;
