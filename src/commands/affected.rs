//! `blast affected` - compute the truly affected projects
//!
//! This command analyzes file changes (via git) and determines:
//! - Which projects contain changed top-level statements
//! - Which projects reference those statements, transitively
//! - Which projects are pulled in by non-source assets, lockfile deltas,
//!   always-include patterns, and declared implicit dependencies
//!
//! With an ACTION argument the result is handed to `npx nx run-many`.

use crate::assets;
use crate::core::config::{self, BlastConfig};
use crate::core::error::{BlastError, BlastResult, ExitCode, print_error};
use crate::core::vcs::{ChangedFile, SystemGit};
use crate::engine::{Engine, TextReferenceResolver};
use crate::index::{self, FileIndex};
use crate::lockfile::{self, PackageManager};
use crate::project::{self, ImplicitGraph, Project};
use crate::ui::Logger;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Files always considered affecting their project, regardless of content
const DEFAULT_INCLUDE_PATTERN: &str = r"\.(spec|test)\.(ts|js)x?$";

/// Output format for the affected command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Json,
  Names,
}

impl OutputFormat {
  fn from_str(s: &str) -> BlastResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      _ => Err(BlastError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names",
        s
      ))),
    }
  }
}

pub struct AffectedOptions {
  pub cwd: Option<PathBuf>,
  pub action: Option<String>,
  pub base: Option<String>,
  pub all: bool,
  pub format: String,
  pub target: Option<String>,
  pub include_files: Vec<String>,
  pub lockfile_check: bool,
  pub verbose: bool,
  pub action_args: Vec<String>,
}

/// Run the affected command
pub fn run_affected(options: AffectedOptions) -> BlastResult<()> {
  let format = OutputFormat::from_str(&options.format)?;
  let log = Logger::new("AFFECTED", options.verbose);

  let cwd = match &options.cwd {
    Some(dir) => dir.clone(),
    None => std::env::current_dir()?,
  };

  let config = BlastConfig::load(&cwd)?;
  let base = options
    .base
    .clone()
    .or(config.base.clone())
    .unwrap_or_else(|| "origin/main".to_string());
  let ignored_paths = config.ignored_paths.clone().unwrap_or_else(config::default_ignored_paths);

  let projects = project::discover(&cwd, &ignored_paths, &log)?;
  log.debug(format!("Found {} projects", projects.len()));

  let mut affected = if options.all {
    projects.iter().map(|p| p.name.clone()).collect()
  } else {
    analyze(&cwd, &base, &projects, &ignored_paths, &config, &options, &log)?
  };

  ImplicitGraph::build(&projects).expand(&mut affected);

  if let Some(target) = &options.target {
    let wanted: Vec<&str> = target.split(',').map(str::trim).collect();
    affected.retain(|name| {
      projects
        .iter()
        .any(|p| &p.name == name && p.targets.iter().any(|t| wanted.contains(&t.as_str())))
    });
  }

  display_results(&affected, format);

  // "log" is the display-only default action
  match options.action.as_deref().filter(|a| *a != "log") {
    Some(action) => run_action(&cwd, action, &affected, &options.action_args, &log),
    None => Ok(()),
  }
}

fn analyze(
  cwd: &Path,
  base: &str,
  projects: &[Project],
  ignored_paths: &[String],
  config: &BlastConfig,
  options: &AffectedOptions,
  log: &Logger,
) -> BlastResult<IndexSet<String>> {
  let git = SystemGit::open(cwd)?;
  let changed_files = git.changed_files(base)?;
  log.debug(format!("Found {} changed files", changed_files.len()));

  let file_index = FileIndex::build(cwd, projects, ignored_paths)?;
  log.debug(format!("Indexed {} source files", file_index.len()));

  let resolver = TextReferenceResolver::new(&file_index);
  let manager = PackageManager::detect(cwd);

  let (source_changes, non_source_paths): (Vec<ChangedFile>, Vec<PathBuf>) =
    partition_changes(&changed_files, &file_index, manager);

  let mut all_changes = source_changes;
  let mut asset_hits = Vec::new();

  if !non_source_paths.is_empty() {
    log.debug(format!(
      "Finding referencing code for {} non-source file(s)",
      non_source_paths.len()
    ));
    for path in &non_source_paths {
      asset_hits.extend(assets::find_non_source_affected(&file_index, path)?);
    }
  }

  let lockfile_check = options.lockfile_check || config.lockfile_check.unwrap_or(false);
  if lockfile_check
    && let Some(manager) = manager
    && lockfile::lockfile_changed(manager, &changed_files)
  {
    log.debug("Lockfile has changed, finding affected import sites");
    all_changes.extend(lockfile::find_lockfile_affected(
      manager,
      &git,
      base,
      cwd,
      &file_index,
      log,
    )?);
  }

  let engine = Engine::new(&file_index, projects, &resolver, log.with_namespace("ENGINE"));
  let mut affected = engine.affected_projects(&all_changes, &asset_hits)?;

  // Always-include patterns attribute the owning project directly, without
  // reference expansion.
  let include = include_patterns(config, options)?;
  for change in &changed_files {
    let path_str = change.file_path.to_string_lossy();
    if include.iter().any(|p| p.is_match(&path_str))
      && let Some(project) = project::project_for_path(&change.file_path, projects)
    {
      affected.insert(project.name.clone());
    }
  }

  Ok(affected)
}

/// Split changed files into engine input and non-source candidates.
///
/// The lockfile is excluded from both; it has its own flow.
fn partition_changes(
  changed_files: &[ChangedFile],
  file_index: &FileIndex,
  manager: Option<PackageManager>,
) -> (Vec<ChangedFile>, Vec<PathBuf>) {
  let lockfile_name = manager.map(|m| m.lockfile_name());
  let mut source = Vec::new();
  let mut non_source = Vec::new();

  for change in changed_files {
    if lockfile_name.is_some_and(|name| change.file_path == Path::new(name)) {
      continue;
    }
    if file_index.contains(&change.file_path) {
      source.push(change.clone());
    } else if !index::is_source_path(&change.file_path) {
      non_source.push(change.file_path.clone());
    }
  }

  (source, non_source)
}

fn include_patterns(config: &BlastConfig, options: &AffectedOptions) -> BlastResult<Vec<regex::Regex>> {
  let mut patterns = vec![regex::Regex::new(DEFAULT_INCLUDE_PATTERN)?];
  for entry in config.include_files.iter().chain(&options.include_files) {
    patterns.push(regex::Regex::new(entry).map_err(|e| {
      BlastError::message(format!("Invalid include-files pattern '{}': {}", entry, e))
    })?);
  }
  Ok(patterns)
}

fn display_results(affected: &IndexSet<String>, format: OutputFormat) {
  match format {
    OutputFormat::Text => {
      if affected.is_empty() {
        println!("✅ No projects affected");
        return;
      }
      println!("📦 {} affected project(s):", affected.len());
      for name in affected {
        println!("  - {}", name);
      }
    }
    OutputFormat::Json => {
      let payload = serde_json::json!({ "affected": affected.iter().collect::<Vec<_>>() });
      println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string()));
    }
    OutputFormat::Names => {
      for name in affected {
        println!("{}", name);
      }
    }
  }
}

/// Hand the affected set to `npx nx run-many`, inheriting stdio.
fn run_action(
  cwd: &Path,
  action: &str,
  affected: &IndexSet<String>,
  action_args: &[String],
  log: &Logger,
) -> BlastResult<()> {
  if affected.is_empty() {
    log.info("Nothing to run");
    return Ok(());
  }

  let projects_csv = affected.iter().cloned().collect::<Vec<_>>().join(",");
  let mut cmd = Command::new("npx");
  cmd
    .current_dir(cwd)
    .arg("nx")
    .arg("run-many")
    .arg(format!("--target={}", action))
    .arg(format!("--projects={}", projects_csv));
  for arg in action_args {
    cmd.arg(arg);
  }

  log.info(format!("Running '{}' for: {}", action, projects_csv));
  let status = cmd
    .status()
    .map_err(|e| BlastError::message(format!("Failed to execute npx nx run-many: {}", e)))?;

  // Pass the runner's exit code through so CI sees the real failure.
  if !status.success() {
    print_error(&BlastError::message(format!("nx run-many --target={} failed", action)));
    std::process::exit(action_failure_code(status));
  }

  Ok(())
}

/// Exit code to propagate when the action runner fails.
///
/// A child killed by a signal has no code; that maps to a system failure.
fn action_failure_code(status: std::process::ExitStatus) -> i32 {
  status.code().unwrap_or(ExitCode::System.as_i32())
}
