//! Repository credential resolution
//!
//! Each value resolves independently: command-line flag first, then the
//! environment, then the config file (repository location only). The
//! password and the password file are mutually exclusive at every layer.

use crate::config::VaultConfig;
use anyhow::{Context, Result};
use clap::Args;
use engine::RepoSecret;
use std::path::PathBuf;

pub const REPO_ENV: &str = "TIMEVAULT_REPO";
pub const PASSWORD_ENV: &str = "TIMEVAULT_PASSWORD";
pub const PASSWORD_FILE_ENV: &str = "TIMEVAULT_PASSWORD_FILE";

/// Repository flags shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct RepoArgs {
    /// Repository location (default: $TIMEVAULT_REPO or the config file)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Repository password (default: $TIMEVAULT_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// File holding the repository password (default: $TIMEVAULT_PASSWORD_FILE)
    #[arg(long, conflicts_with = "password")]
    pub password_file: Option<PathBuf>,
}

/// Everything needed to open the repository.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub repository: String,
    pub secret: RepoSecret,
}

/// Resolve credentials for one command invocation.
pub fn resolve(args: &RepoArgs, config: &VaultConfig) -> Result<Credentials> {
    resolve_from(args.clone(), env_layer(), config.repo.clone())
}

fn env_layer() -> RepoArgs {
    RepoArgs {
        repo: env_var(REPO_ENV),
        password: env_var(PASSWORD_ENV),
        password_file: env_var(PASSWORD_FILE_ENV).map(PathBuf::from),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn resolve_from(flags: RepoArgs, env: RepoArgs, config_repo: Option<String>) -> Result<Credentials> {
    let repository = flags.repo.or(env.repo).or(config_repo).context(
        "No repository configured; pass --repo, set TIMEVAULT_REPO, or add `repo:` to the config file",
    )?;

    // A flag beats anything in the environment.
    let secret = match (flags.password, flags.password_file) {
        (Some(_), Some(_)) => {
            anyhow::bail!("--password and --password-file are mutually exclusive")
        }
        (Some(password), None) => RepoSecret::Password(password),
        (None, Some(file)) => RepoSecret::PasswordFile(file),
        (None, None) => match (env.password, env.password_file) {
            (Some(_), Some(_)) => anyhow::bail!(
                "Both {} and {} are set; unset one",
                PASSWORD_ENV,
                PASSWORD_FILE_ENV
            ),
            (Some(password), None) => RepoSecret::Password(password),
            (None, Some(file)) => RepoSecret::PasswordFile(file),
            (None, None) => anyhow::bail!(
                "No repository password configured; pass --password / --password-file or set {} / {}",
                PASSWORD_ENV,
                PASSWORD_FILE_ENV
            ),
        },
    };

    Ok(Credentials { repository, secret })
}
