//! Bounded subprocess capture
//!
//! External commands (git, package manager listings) are blocking, synchronous
//! calls with a hard cap on captured output. Exceeding the cap is a fatal error
//! for that call, never a silent truncation.

use crate::core::error::{BlastError, BlastResult, GitError};
use std::process::{Command, Output};

/// Capture buffer cap for subprocess output (10 MB)
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Outcome of a captured subprocess run
pub struct Captured {
  pub stdout: String,
  pub stderr: String,
  pub success: bool,
}

/// Run a command, capture stdout/stderr, and enforce the output cap.
///
/// Command failure (non-zero exit) is NOT an error here; callers decide
/// whether a failure is recoverable control flow or fatal.
pub fn run_captured(cmd: &mut Command, display: &str) -> BlastResult<Captured> {
  let output: Output = cmd
    .output()
    .map_err(|e| BlastError::message(format!("Failed to execute `{}`: {}", display, e)))?;

  if output.stdout.len() > MAX_OUTPUT_BYTES || output.stderr.len() > MAX_OUTPUT_BYTES {
    return Err(BlastError::Git(GitError::OutputTooLarge {
      command: display.to_string(),
      limit: MAX_OUTPUT_BYTES,
    }));
  }

  Ok(Captured {
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    success: output.status.success(),
  })
}
