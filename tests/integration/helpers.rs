//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test monorepo with git history and nx-style project.json files
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a new empty workspace with git initialized
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a project under libs/<name> with a project.json and a src dir
  pub fn add_project(&self, name: &str, implicit_deps: &[&str]) -> Result<()> {
    let project_dir = self.path.join("libs").join(name);
    std::fs::create_dir_all(project_dir.join("src"))?;

    let implicit = implicit_deps
      .iter()
      .map(|d| format!("\"{}\"", d))
      .collect::<Vec<_>>()
      .join(", ");

    std::fs::write(
      project_dir.join("project.json"),
      format!(
        r#"{{
  "name": "{}",
  "sourceRoot": "libs/{}/src",
  "implicitDependencies": [{}],
  "targets": {{ "build": {{}}, "test": {{}} }}
}}
"#,
        name, name, implicit
      ),
    )?;

    Ok(())
  }

  /// Write a file relative to the workspace root
  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    Ok(())
  }

  /// Create the baseline branch affected runs compare against
  pub fn baseline(&self) -> Result<()> {
    git(&self.path, &["branch", "origin/main"])?;
    Ok(())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the blast CLI, failing the test on a non-zero exit
pub fn run_blast(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_blast_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "blast command failed: blast {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run the blast CLI without asserting on the exit status
pub fn run_blast_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let blast_bin = env!("CARGO_BIN_EXE_blast");

  Command::new(blast_bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run blast")
}
