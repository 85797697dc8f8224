//! Subprocess wrapper around the restic binary

use crate::snapshot::Snapshot;
use crate::{platform, Engine, EngineError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use tracing::{debug, info, warn};

/// Exit code restic uses when a backup finished but some files were unreadable.
const EXIT_BACKUP_INCOMPLETE: i32 = 3;

/// Repository schemes that cannot be probed through the filesystem.
const REMOTE_SCHEMES: [&str; 7] = ["sftp:", "rest:", "s3:", "b2:", "azure:", "gs:", "rclone:"];

/// Secret material restic needs to open the repository.
///
/// Exactly one form is ever handed to the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSecret {
    Password(String),
    PasswordFile(PathBuf),
}

impl RepoSecret {
    /// Environment variable name/value pair for the restic child process.
    fn env_var(&self) -> (&'static str, OsString) {
        match self {
            RepoSecret::Password(password) => ("RESTIC_PASSWORD", OsString::from(password)),
            RepoSecret::PasswordFile(path) => ("RESTIC_PASSWORD_FILE", OsString::from(path)),
        }
    }
}

/// Restic-backed implementation of [`Engine`].
///
/// Every call spawns a fresh `restic` process with the repository and
/// secret passed through the environment, never argv.
#[derive(Debug)]
pub struct ResticEngine {
    repository: String,
    secret: RepoSecret,
    binary: PathBuf,
}

impl ResticEngine {
    pub fn new(repository: impl Into<String>, secret: RepoSecret) -> Self {
        Self {
            repository: repository.into(),
            secret,
            binary: PathBuf::from("restic"),
        }
    }

    /// Use a specific restic binary instead of the one on PATH.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Whether the repository already holds a restic config.
    ///
    /// Local paths are probed on the filesystem. Remote schemes fall back
    /// to `restic cat config`, which only succeeds once initialized.
    pub fn repository_exists(&self) -> bool {
        if is_remote_repository(&self.repository) {
            match self.output("cat", &["cat".to_string(), "config".to_string()]) {
                Ok(output) => output.status.success(),
                Err(e) => {
                    debug!("Repository probe failed: {}", e);
                    false
                }
            }
        } else {
            Path::new(&self.repository).join("config").is_file()
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.env("RESTIC_REPOSITORY", &self.repository);
        let (name, value) = self.secret.env_var();
        cmd.env(name, value);
        cmd
    }

    /// Run restic with output captured.
    fn output(&self, name: &'static str, args: &[String]) -> Result<Output, EngineError> {
        debug!("Running restic {}", args.join(" "));
        self.command()
            .args(args)
            .output()
            .map_err(|source| EngineError::Io { command: name, source })
    }

    /// Run restic with output captured, requiring a zero exit.
    fn output_checked(&self, name: &'static str, args: &[String]) -> Result<Output, EngineError> {
        let output = self.output(name, args)?;
        if !output.status.success() {
            return Err(command_failed(name, &output));
        }
        Ok(output)
    }
}

impl Engine for ResticEngine {
    fn init(&self) -> Result<(), EngineError> {
        info!("Initializing repository at {}", self.repository);
        self.output_checked("init", &["init".to_string()])?;
        Ok(())
    }

    fn backup(
        &self,
        paths: &[PathBuf],
        exclude_patterns: &[String],
        tags: &[String],
        verbose: bool,
    ) -> Result<Option<String>, EngineError> {
        let args = backup_args(paths, exclude_patterns, tags, verbose);

        if verbose {
            // Progress streams straight to the terminal; without JSON output
            // there is no snapshot id to recover.
            debug!("Running restic {}", args.join(" "));
            let status = self
                .command()
                .args(&args)
                .status()
                .map_err(|source| EngineError::Io { command: "backup", source })?;
            return match status.code() {
                Some(0) => Ok(None),
                Some(EXIT_BACKUP_INCOMPLETE) => {
                    warn!("Backup completed with warnings (some files could not be read)");
                    Ok(None)
                }
                code => Err(EngineError::CommandFailed {
                    command: "backup",
                    code: code.unwrap_or(-1),
                    stderr: String::new(),
                }),
            };
        }

        let output = self.output("backup", &args)?;
        match output.status.code() {
            Some(0) => {}
            Some(EXIT_BACKUP_INCOMPLETE) => {
                warn!("Backup completed with warnings (some files could not be read)");
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    warn!("restic stderr: {}", stderr.trim());
                }
            }
            _ => return Err(command_failed("backup", &output)),
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let snapshot_id = parse_backup_summary(&stdout);
        match &snapshot_id {
            Some(id) => info!("Created snapshot {}", id),
            None => warn!("No snapshot id found in restic output"),
        }
        Ok(snapshot_id)
    }

    fn snapshots(&self) -> Result<Vec<Snapshot>, EngineError> {
        let output =
            self.output_checked("snapshots", &["snapshots".to_string(), "--json".to_string()])?;
        serde_json::from_slice(&output.stdout)
            .map_err(|source| EngineError::InvalidOutput { command: "snapshots", source })
    }

    fn forget(&self, snapshot_ids: &[String]) -> Result<(), EngineError> {
        if snapshot_ids.is_empty() {
            return Ok(());
        }
        let mut args = vec!["forget".to_string()];
        args.extend_from_slice(snapshot_ids);
        self.output_checked("forget", &args)?;
        info!("Forgot {} snapshots", snapshot_ids.len());
        Ok(())
    }

    fn prune(&self) -> Result<(), EngineError> {
        self.output_checked("prune", &["prune".to_string()])?;
        info!("Pruned repository");
        Ok(())
    }

    fn check(&self) -> Result<(), EngineError> {
        self.output_checked("check", &["check".to_string()])?;
        Ok(())
    }

    fn restore(&self, snapshot_id: &str, paths: &[String], target: &Path) -> Result<(), EngineError> {
        let args = restore_args(snapshot_id, paths, target);
        self.output_checked("restore", &args)?;
        info!("Restored {} path(s) from snapshot {}", paths.len(), snapshot_id);
        Ok(())
    }

    fn mount(&self, target: &Path) -> Result<Child, EngineError> {
        debug!("Running restic mount {}", target.display());
        self.command()
            .arg("mount")
            .arg(target)
            .spawn()
            .map_err(|source| EngineError::Io { command: "mount", source })
    }

    fn unmount(&self, target: &Path) -> Result<(), EngineError> {
        let (program, args) = platform::unmount_command(target);
        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|source| EngineError::Io { command: "unmount", source })?;
        if !output.status.success() {
            return Err(EngineError::CommandFailed {
                command: "unmount",
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!("Unmounted repository from {}", target.display());
        Ok(())
    }
}

fn command_failed(command: &'static str, output: &Output) -> EngineError {
    EngineError::CommandFailed {
        command,
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn is_remote_repository(repository: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| repository.starts_with(scheme))
}

fn backup_args(
    paths: &[PathBuf],
    exclude_patterns: &[String],
    tags: &[String],
    verbose: bool,
) -> Vec<String> {
    let mut args = vec!["backup".to_string()];
    if verbose {
        args.push("--verbose".to_string());
    } else {
        // JSON output is the only way to recover the snapshot id afterwards.
        args.push("--json".to_string());
    }
    args.extend(paths.iter().map(|p| p.display().to_string()));
    args.extend(exclude_patterns.iter().map(|p| format!("--exclude={}", p)));
    args.extend(tags.iter().map(|t| format!("--tag={}", t)));
    args
}

fn restore_args(snapshot_id: &str, paths: &[String], target: &Path) -> Vec<String> {
    let mut args = vec![
        "restore".to_string(),
        snapshot_id.to_string(),
        format!("--target={}", target.display()),
    ];
    for path in paths {
        args.push("--include".to_string());
        args.push(path.clone());
    }
    args
}

/// Pull the snapshot id out of restic's line-delimited JSON backup output.
///
/// The summary is the last message restic emits, so scan from the end and
/// skip over status lines.
fn parse_backup_summary(stdout: &str) -> Option<String> {
    for line in stdout.lines().rev() {
        let value: serde_json::Value = match serde_json::from_str(line.trim()) {
            Ok(value) => value,
            Err(_) => continue,
        };
        if value.get("message_type").and_then(serde_json::Value::as_str) == Some("summary") {
            return value
                .get("snapshot_id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_args_default_shape() {
        let args = backup_args(
            &[PathBuf::from("/home/user")],
            &["*.cache".to_string()],
            &["home".to_string()],
            false,
        );
        assert_eq!(
            args,
            vec!["backup", "--json", "/home/user", "--exclude=*.cache", "--tag=home"]
        );
    }

    #[test]
    fn backup_args_verbose_streams_without_json() {
        let args = backup_args(&[PathBuf::from("/etc")], &[], &[], true);
        assert_eq!(args, vec!["backup", "--verbose", "/etc"]);
    }

    #[test]
    fn restore_args_include_each_path() {
        let args = restore_args(
            "abc123",
            &["Brewfile".to_string(), "mas.txt".to_string()],
            Path::new("/tmp/out"),
        );
        assert_eq!(
            args,
            vec![
                "restore",
                "abc123",
                "--target=/tmp/out",
                "--include",
                "Brewfile",
                "--include",
                "mas.txt"
            ]
        );
    }

    #[test]
    fn secret_env_var_forms() {
        let (name, value) = RepoSecret::Password("hunter2".to_string()).env_var();
        assert_eq!(name, "RESTIC_PASSWORD");
        assert_eq!(value, OsString::from("hunter2"));

        let (name, value) = RepoSecret::PasswordFile(PathBuf::from("/etc/tv/pass")).env_var();
        assert_eq!(name, "RESTIC_PASSWORD_FILE");
        assert_eq!(value, OsString::from("/etc/tv/pass"));
    }

    #[test]
    fn summary_line_yields_snapshot_id() {
        let stdout = concat!(
            r#"{"message_type":"status","percent_done":0.5}"#,
            "\n",
            r#"{"message_type":"status","percent_done":1.0}"#,
            "\n",
            r#"{"message_type":"summary","files_new":12,"snapshot_id":"5c3a6e71"}"#,
            "\n",
        );
        assert_eq!(parse_backup_summary(stdout), Some("5c3a6e71".to_string()));
    }

    #[test]
    fn missing_summary_yields_none() {
        assert_eq!(parse_backup_summary(""), None);
        assert_eq!(parse_backup_summary("plain text output\n"), None);
        assert_eq!(parse_backup_summary(r#"{"message_type":"status"}"#), None);
    }

    #[test]
    fn local_repository_probe_checks_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = ResticEngine::new(
            dir.path().display().to_string(),
            RepoSecret::Password("x".to_string()),
        );
        assert!(!engine.repository_exists());

        std::fs::write(dir.path().join("config"), b"{}").unwrap();
        assert!(engine.repository_exists());
    }

    #[test]
    fn remote_schemes_are_detected() {
        assert!(is_remote_repository("sftp:backup@host:/srv/restic"));
        assert!(is_remote_repository("s3:https://s3.amazonaws.com/bucket"));
        assert!(is_remote_repository("rest:https://backup.example.com/"));
        assert!(!is_remote_repository("/var/backups/restic"));
        assert!(!is_remote_repository("relative/path"));
    }
}
