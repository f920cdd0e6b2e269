//! `blast projects` - list the projects discovered in the workspace

use crate::core::config::{self, BlastConfig};
use crate::core::error::BlastResult;
use crate::project::{self, Project};
use crate::ui::Logger;
use std::path::PathBuf;

/// Run the projects command
pub fn run_projects(cwd: Option<PathBuf>, json: bool, verbose: bool) -> BlastResult<()> {
  let log = Logger::new("PROJECTS", verbose);

  let cwd = match cwd {
    Some(dir) => dir,
    None => std::env::current_dir()?,
  };

  let config = BlastConfig::load(&cwd)?;
  let ignored_paths = config.ignored_paths.unwrap_or_else(config::default_ignored_paths);

  let projects = project::discover(&cwd, &ignored_paths, &log)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&projects)?);
    return Ok(());
  }

  println!("📦 {} project(s):", projects.len());
  for Project { name, source_root, .. } in &projects {
    println!("  - {} ({})", name, source_root.display());
  }

  Ok(())
}
