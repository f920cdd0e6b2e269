//! System git backend - zero dependencies, maximum performance
//!
//! Uses git plumbing commands for all operations. Optimized for:
//! - One subprocess call per operation
//! - Safe subprocess execution (isolated environment)
//! - Bounded output capture (oversized output is fatal, never truncated)

use crate::core::error::{BlastError, BlastResult, GitError};
use crate::core::proc::run_captured;
use crate::core::vcs::changes::{ChangedFile, parse_diff};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  repo_path: PathBuf,

  /// Working tree root
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> BlastResult<Self> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(path).args(["rev-parse", "--show-toplevel"]);

    let out = run_captured(&mut cmd, "git rev-parse --show-toplevel")?;

    if !out.success {
      if out.stderr.contains("not a git repository") {
        return Err(BlastError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(BlastError::message(format!(
        "Failed to open git repository: {}",
        out.stderr
      )));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(out.stdout.trim()),
    })
  }

  /// Working tree root as reported by git
  #[allow(dead_code)]
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Resolve the comparison point for `base`.
  ///
  /// Fallback chain: `merge-base` → `merge-base --fork-point` → `base` verbatim.
  /// Each fallback triggers only on command failure, never on output content.
  /// This chain is silent; an unusable base surfaces later at the diff step.
  pub fn merge_base(&self, base: &str) -> BlastResult<String> {
    let mut cmd = self.git_cmd();
    cmd.args(["merge-base", base, "HEAD"]);
    let out = run_captured(&mut cmd, "git merge-base")?;
    if out.success {
      return Ok(out.stdout.trim().to_string());
    }

    let mut cmd = self.git_cmd();
    cmd.args(["merge-base", "--fork-point", base, "HEAD"]);
    let out = run_captured(&mut cmd, "git merge-base --fork-point")?;
    if out.success {
      return Ok(out.stdout.trim().to_string());
    }

    Ok(base.to_string())
  }

  /// Resolve the change-set against `base`.
  ///
  /// Diffs with zero context lines so every hunk start is a changed line in
  /// the post-change file. An invalid base fails loudly, naming the revision;
  /// returning an empty change-set instead would be unsafe for CI gating.
  pub fn changed_files(&self, base: &str) -> BlastResult<Vec<ChangedFile>> {
    let comparison = self.merge_base(base)?;

    let mut cmd = self.git_cmd();
    cmd.args(["diff", &comparison, "--unified=0"]);
    let out = run_captured(&mut cmd, "git diff")?;

    if !out.success {
      return Err(BlastError::Git(GitError::RevisionNotFound {
        revision: base.to_string(),
        stderr: out.stderr.trim().to_string(),
      }));
    }

    Ok(parse_diff(&out.stdout))
  }

  /// Read a file at a specific revision.
  ///
  /// Returns None if the file does not exist at that revision; the lockfile
  /// comparison treats a missing prior state as empty, not as an error.
  pub fn show_file(&self, revision: &str, path: &Path) -> BlastResult<Option<String>> {
    let spec = format!("{}:{}", revision, path.display());

    let mut cmd = self.git_cmd();
    cmd.args(["show", &spec]);
    let out = run_captured(&mut cmd, "git show")?;

    if !out.success {
      return Ok(None);
    }

    Ok(Some(out.stdout))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}
