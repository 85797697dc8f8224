//! Platform differences for mount handling
//!
//! Centralizes the macOS vs Linux differences so callers never scatter
//! `cfg!(target_os = ...)` checks of their own.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub fn is_macos() -> bool {
    cfg!(target_os = "macos")
}

pub fn is_linux() -> bool {
    cfg!(target_os = "linux")
}

/// Platform-appropriate default mount point.
pub fn default_mount_path() -> PathBuf {
    if is_macos() {
        PathBuf::from("/Volumes/TimeVault")
    } else {
        PathBuf::from("/mnt/timevault")
    }
}

/// Program and arguments that unmount `target`.
///
/// macOS uses plain `umount`; Linux FUSE mounts need `fusermount -u`.
pub fn unmount_command(target: &Path) -> (&'static str, Vec<OsString>) {
    if is_macos() {
        ("umount", vec![OsString::from(target)])
    } else {
        ("fusermount", vec![OsString::from("-u"), OsString::from(target)])
    }
}
