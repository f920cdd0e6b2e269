//! Error types for blast with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. CI gating depends on failures being loud:
//! silently returning an empty affected set is indistinguishable from "nothing
//! changed", so configuration errors always surface with the offending input.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for blast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, subprocess, I/O)
  System = 2,
  /// Validation failure (project registry problems)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for blast
#[derive(Debug)]
pub enum BlastError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Lockfile analysis errors
  Lockfile(LockfileError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl BlastError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    BlastError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    BlastError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      BlastError::Message { message, context, help } => BlastError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      BlastError::Config(_) => ExitCode::User,
      BlastError::Git(_) => ExitCode::System,
      BlastError::Lockfile(_) => ExitCode::System,
      BlastError::Io(_) => ExitCode::System,
      BlastError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      BlastError::Config(e) => e.help_message(),
      BlastError::Git(e) => e.help_message(),
      BlastError::Lockfile(e) => e.help_message(),
      BlastError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for BlastError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BlastError::Config(e) => write!(f, "{}", e),
      BlastError::Git(e) => write!(f, "{}", e),
      BlastError::Lockfile(e) => write!(f, "{}", e),
      BlastError::Io(e) => write!(f, "I/O error: {}", e),
      BlastError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for BlastError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      BlastError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<ConfigError> for BlastError {
  fn from(err: ConfigError) -> Self {
    BlastError::Config(err)
  }
}

impl From<GitError> for BlastError {
  fn from(err: GitError) -> Self {
    BlastError::Git(err)
  }
}

impl From<LockfileError> for BlastError {
  fn from(err: LockfileError) -> Self {
    BlastError::Lockfile(err)
  }
}

impl From<io::Error> for BlastError {
  fn from(err: io::Error) -> Self {
    BlastError::Io(err)
  }
}

impl From<String> for BlastError {
  fn from(msg: String) -> Self {
    BlastError::message(msg)
  }
}

impl From<&str> for BlastError {
  fn from(msg: &str) -> Self {
    BlastError::message(msg)
  }
}

impl From<serde_json::Error> for BlastError {
  fn from(err: serde_json::Error) -> Self {
    BlastError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for BlastError {
  fn from(err: serde_yaml::Error) -> Self {
    BlastError::message(format!("YAML error: {}", err))
  }
}

impl From<toml_edit::TomlError> for BlastError {
  fn from(err: toml_edit::TomlError) -> Self {
    BlastError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for BlastError {
  fn from(err: toml_edit::de::Error) -> Self {
    BlastError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<regex::Error> for BlastError {
  fn from(err: regex::Error) -> Self {
    BlastError::message(format!("Pattern error: {}", err))
  }
}

impl From<glob::PatternError> for BlastError {
  fn from(err: glob::PatternError) -> Self {
    BlastError::message(format!("Glob pattern error: {}", err))
  }
}

impl From<std::str::Utf8Error> for BlastError {
  fn from(err: std::str::Utf8Error) -> Self {
    BlastError::message(format!("UTF-8 error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for BlastError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    BlastError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for BlastError {
  fn from(err: std::path::StripPrefixError) -> Self {
    BlastError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// No project registry could be discovered in the workspace
  NoProjects { workspace_root: PathBuf },

  /// blast.toml exists but could not be parsed
  Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NoProjects { .. } => Some(
        "blast discovers projects from nx project.json files or package.json/pnpm-workspace.yaml workspaces. \
         Run from the monorepo root."
          .to_string(),
      ),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NoProjects { workspace_root } => {
        write!(f, "No projects found under {}", workspace_root.display())
      }
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration at {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// The base revision for the diff does not exist
  RevisionNotFound { revision: String, stderr: String },

  /// Subprocess output exceeded the capture buffer
  OutputTooLarge { command: String, limit: usize },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RevisionNotFound { revision, .. } => Some(format!(
        "Fetch the base ref first (e.g. `git fetch origin`) or pass --base with an existing revision instead of '{}'.",
        revision
      )),
      GitError::RepoNotFound { path } => Some(format!(
        "Run blast inside a git repository, or pass --cwd. Checked: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::RevisionNotFound { revision, stderr } => {
        write!(f, "Base revision '{}' not found in repository\n{}", revision, stderr)
      }
      GitError::OutputTooLarge { command, limit } => {
        write!(f, "Output of `{}` exceeded the {} byte capture buffer", command, limit)
      }
    }
  }
}

/// Lockfile analysis errors
#[derive(Debug)]
pub enum LockfileError {
  /// The current lockfile could not be read
  Unreadable { path: PathBuf, reason: String },

  /// The lockfile content could not be parsed
  Unparsable { path: PathBuf, reason: String },
}

impl LockfileError {
  fn help_message(&self) -> Option<String> {
    match self {
      LockfileError::Unreadable { .. } => {
        Some("Re-run the package manager install to regenerate the lockfile.".to_string())
      }
      LockfileError::Unparsable { .. } => None,
    }
  }
}

impl fmt::Display for LockfileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LockfileError::Unreadable { path, reason } => {
        write!(f, "Could not read lockfile {}: {}", path.display(), reason)
      }
      LockfileError::Unparsable { path, reason } => {
        write!(f, "Could not parse lockfile {}: {}", path.display(), reason)
      }
    }
  }
}

/// Result type alias for blast
pub type BlastResult<T> = Result<T, BlastError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> BlastResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> BlastResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<BlastError>,
{
  fn context(self, ctx: impl Into<String>) -> BlastResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> BlastResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &BlastError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

/// Convert anyhow::Error to BlastError (test helpers use anyhow)
impl From<anyhow::Error> for BlastError {
  fn from(err: anyhow::Error) -> Self {
    BlastError::message(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exit_codes() {
    assert_eq!(BlastError::message("boom").exit_code().as_i32(), 1);
    assert_eq!(
      BlastError::Git(GitError::RepoNotFound { path: "/tmp".into() }).exit_code().as_i32(),
      2
    );
  }

  #[test]
  fn test_revision_not_found_names_revision() {
    let err = BlastError::Git(GitError::RevisionNotFound {
      revision: "origin/missing".to_string(),
      stderr: "fatal: bad revision".to_string(),
    });
    assert!(err.to_string().contains("origin/missing"));
    assert!(err.help_message().unwrap().contains("origin/missing"));
  }

  #[test]
  fn test_sub_errors_convert_with_their_exit_codes() {
    fn fails() -> BlastResult<()> {
      Err(LockfileError::Unreadable {
        path: "/ws/yarn.lock".into(),
        reason: "denied".to_string(),
      })?;
      Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(err, BlastError::Lockfile(_)));
    assert_eq!(err.exit_code().as_i32(), 2);

    let err: BlastError = ConfigError::NoProjects { workspace_root: "/ws".into() }.into();
    assert_eq!(err.exit_code().as_i32(), 1);
  }

  #[test]
  fn test_context_chains() {
    let err = BlastError::message("inner").context("outer");
    assert!(err.to_string().contains("inner"));
    assert!(err.to_string().contains("outer"));
  }
}
